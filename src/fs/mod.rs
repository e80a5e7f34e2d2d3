//! 文件系统高级 API
//!
//! 这个模块提供 sdfs 资源目录的打开、顺序读取、校验和诊断接口。

mod file;
mod filesystem;
mod path;
mod types;

pub use file::SdFile;
pub use filesystem::Sdfs;
pub use path::{parse_path, SdPath};
pub use types::{SdfsConfig, SeekFrom};
