//! 外部协作者的数据结构
//!
//! 存储 ID、分区描述以及分区表接口。分区表本身由外部管理，这里只消费。

use crate::consts::SDFS_PART_FILE_ID_BASE;

/// 存储设备 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum StorageId {
    /// 系统 NOR flash
    Nor = 0,
    /// SD 卡
    Sd = 1,
    /// SPI NAND
    Nand = 2,
    /// 数据 NOR flash
    DataNor = 3,
    /// 从 NAND 启动时的 NAND 别名
    BootNand = 4,
}

impl StorageId {
    /// 设备绑定所用的 ID（`BootNand` 与 `Nand` 共用一个设备）
    pub fn binding(self) -> StorageId {
        match self {
            StorageId::BootNand => StorageId::Nand,
            other => other,
        }
    }

    /// 从卷名解析（`NOR`/`SD`/`NAND`/`DATA`）
    pub fn from_volume(volume: &str) -> Option<Self> {
        match volume {
            "NOR" => Some(StorageId::Nor),
            "SD" => Some(StorageId::Sd),
            "NAND" => Some(StorageId::Nand),
            "DATA" => Some(StorageId::DataNor),
            _ => None,
        }
    }

    /// 卷名
    pub fn volume(self) -> &'static str {
        match self {
            StorageId::Nor => "NOR",
            StorageId::Sd => "SD",
            StorageId::Nand | StorageId::BootNand => "NAND",
            StorageId::DataNor => "DATA",
        }
    }
}

/// 分区描述（由分区表返回）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// 分区在设备上的起始字节偏移
    pub base_offset: u64,
    /// 分区大小（字节）
    pub size: u64,
}

/// 一个分区的字节寻址视图
///
/// `base` 是分区在设备上的绝对字节偏移，目录头就位于这里。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// 所在存储设备
    pub storage: StorageId,
    /// 分区基址（字节）
    pub base: u64,
}

impl Region {
    /// 创建区域视图
    pub const fn new(storage: StorageId, base: u64) -> Self {
        Self { storage, base }
    }
}

/// 分区表接口
///
/// 对应外部分区管理器的 `get_partition(storage_id, file_id)`。
pub trait PartitionTable {
    /// 查找分区
    fn get_partition(&self, storage: StorageId, file_id: u8) -> Option<Partition>;

    /// 按 SDFS 分区索引查找（A 盘为 0）
    fn sdfs_partition(&self, storage: StorageId, index: u8) -> Option<Partition> {
        let file_id = index.checked_add(SDFS_PART_FILE_ID_BASE)?;
        self.get_partition(storage, file_id)
    }
}

/// 静态分区表：`(存储, file_id, 分区)` 列表
impl PartitionTable for [(StorageId, u8, Partition)] {
    fn get_partition(&self, storage: StorageId, file_id: u8) -> Option<Partition> {
        self.iter()
            .find(|(s, id, _)| s.binding() == storage.binding() && *id == file_id)
            .map(|(_, _, p)| *p)
    }
}

impl<const N: usize> PartitionTable for [(StorageId, u8, Partition); N] {
    fn get_partition(&self, storage: StorageId, file_id: u8) -> Option<Partition> {
        self.as_slice().get_partition(storage, file_id)
    }
}

impl PartitionTable for alloc::vec::Vec<(StorageId, u8, Partition)> {
    fn get_partition(&self, storage: StorageId, file_id: u8) -> Option<Partition> {
        self.as_slice().get_partition(storage, file_id)
    }
}
