//! sdfs 目录模块
//!
//! sdfs 是一个只读的线性资源目录：分区起始处是 32 字节目录头（魔数 `"sdfs.bin"`），
//! 随后是定长目录项，文件内容紧跟其后。
//!
//! ## 模块结构
//!
//! - `entry` - 32 字节记录的解析和编码
//! - `lookup` - 经缓存的线性查找和遍历
//! - `checksum` - 目录/文件/镜像校验和
//! - `builder` - 镜像构建

mod builder;
pub mod checksum;
mod entry;
mod lookup;

pub use builder::ImageBuilder;
pub use checksum::sum32;
pub use entry::{DirEntry, SdDirHeader, SdDirRecord};
pub use lookup::{find_entry, DirIterator, DirLookup};
