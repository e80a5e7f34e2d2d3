//! SDFS 常量定义
//!
//! 这个模块包含了读缓存与目录格式的所有常量定义，包括：
//! - 扇区与槽位尺寸
//! - 对齐单元
//! - 目录记录布局

//=============================================================================
// 基础常量
//=============================================================================

/// 物理扇区大小（512 字节）
///
/// 传给块设备的偏移和长度都是它的整数倍。
pub const SECTOR_SIZE: u32 = 512;

/// 扇区大小的 log2
pub const SECTOR_SHIFT: u32 = 9;

//=============================================================================
// 缓存槽位
//=============================================================================

/// 小槽位长度（2 KiB）
pub const SMALL_SLOT_SIZE: u32 = 2 * 1024;

/// 大槽位长度（32 KiB）
pub const LARGE_SLOT_SIZE: u32 = 32 * 1024;

/// 对齐单元：小槽位长度的一半
///
/// 大小两类槽位的起始偏移都按它向下取整。
pub const ALIGN_UNIT: u32 = SMALL_SLOT_SIZE / 2;

/// 可被缓存的最大请求长度，超过则走无缓冲三段读
pub const MAX_CACHED_READ: u32 = LARGE_SLOT_SIZE - ALIGN_UNIT;

/// 默认小槽位数量
pub const DEFAULT_SMALL_SLOTS: usize = 4;

/// 默认大槽位数量
pub const DEFAULT_LARGE_SLOTS: usize = 1;

/// 默认填充中转缓冲区大小（扇区数，32 KiB）
pub const DEFAULT_SCRATCH_SECTORS: u32 = 64;

//=============================================================================
// 目录格式
//=============================================================================

/// 目录头魔数
pub const SDFS_MAGIC: &[u8; 8] = b"sdfs.bin";

/// 目录记录大小（头和条目相同）
pub const SD_DIR_SIZE: usize = 32;

/// 文件名字段长度
pub const SD_NAME_LEN: usize = 12;

/// 记录内 offset 字段位置（目录头中为条目数）
pub const SD_DIR_OFFSET_POS: usize = 12;

/// 记录内 size 字段位置
pub const SD_DIR_SIZE_POS: usize = 16;

/// 记录内 reserved[0] 字段位置
pub const SD_DIR_RESERVED0_POS: usize = 20;

/// 记录内 reserved[1] 字段位置（目录头中为目录校验和）
pub const SD_DIR_RESERVED1_POS: usize = 24;

/// 记录内 checksum 字段位置
pub const SD_DIR_CHECKSUM_POS: usize = 28;

/// SDFS 分区在分区表中的 file_id 基数
///
/// 分区索引 n 对应 file_id = n + 该基数。
pub const SDFS_PART_FILE_ID_BASE: u8 = 0x10;

/// 分区盘符最大数量（A..=Z）
pub const SDFS_MAX_PARTS: u8 = 26;
