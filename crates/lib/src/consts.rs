/// File name of a pipeline step's results manifest.
pub const RESULTS_FILE_NAME: &str = "results.json";

/// File name of the consolidated listing written to the cache root.
pub const CACHE_LIST_FILE_NAME: &str = "cached_files_makeflow_list.jx";

/// Extension given to metadata sidecar files.
pub const SIDECAR_EXTENSION: &str = "json";

/// Folder depth searched for results manifests when none is given.
pub const DEFAULT_SEARCH_DEPTH: usize = 2;

/// Extension handled by the CSV merge handler.
pub const CSV_EXTENSION: &str = ".csv";
