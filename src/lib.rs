//! sdfs_core: NAND/SD 读缓存与 sdfs 资源目录
//!
//! 位于 UI 资源加载器与原始 NAND/SD 扇区读取之间的一层：
//! - **两级槽位缓存**：小槽位服务短读取，大槽位服务批量读取，按最近使用次序驱逐
//! - **字节级读取**：任意 `(addr, len)` 读取转换为缓存拷贝或头/中/尾三段直读
//! - **sdfs 目录**：分区起始处的线性定长目录，按文件名（忽略大小写）查找
//!
//! # 示例
//!
//! ```rust,ignore
//! use sdfs_core::{BlockDevice, Sdfs, SdfsConfig, StorageId, Result};
//!
//! struct Nand {
//!     // ...
//! }
//!
//! impl BlockDevice for Nand {
//!     fn read_sectors(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
//!         // 读取扇区对齐的字节范围
//!         // ...
//!     }
//! }
//!
//! fn load_logo(partitions: PartTable, nand: Nand) -> Result<Vec<u8>> {
//!     let fs = Sdfs::new(partitions, SdfsConfig::for_ram_kib(4096))?;
//!     fs.attach(StorageId::Nand, nand)?;
//!
//!     let mut file = fs.open_path("/NAND:A/logo.bin")?;
//!     let data = file.read_to_end(&fs)?;
//!     fs.stats(1);
//!     Ok(data)
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`consts`] - 常量定义
//! - [`types`] - 存储 ID、分区和分区表接口
//! - [`block`] - 块设备抽象和字节级读取
//! - [`cache`] - 两级槽位缓存
//! - [`dir`] - sdfs 目录解析、校验和镜像构建
//! - [`fs`] - 文件系统高级 API

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 常量定义
pub mod consts;

/// 数据结构定义
pub mod types;

/// 块设备抽象
pub mod block;

/// 槽位缓存
pub mod cache;

/// sdfs 目录
pub mod dir;

/// 文件系统高级 API
pub mod fs;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 外部协作者
pub use types::{Partition, PartitionTable, Region, StorageId};

// 块设备
pub use block::{BlockDev, BlockDevice};

#[cfg(any(test, feature = "mem"))]
pub use block::MemDevice;

// Cache
pub use cache::{CacheConfig, CacheStats, FillPolicy, SizeClass, SlotCache};

// Dir
pub use dir::{find_entry, DirEntry, DirLookup, ImageBuilder};

// FileSystem
pub use fs::{parse_path, SdFile, Sdfs, SdfsConfig, SeekFrom};
