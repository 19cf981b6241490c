pub mod drive_api;
pub mod file_lookup;
pub mod folder_resolver;
pub mod http_api;
pub mod progress_sink;
pub mod retry_policy;
pub mod upload_engine;
pub mod uploader;

#[cfg(test)]
pub(crate) mod testing;
