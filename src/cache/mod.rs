//! 读缓存模块
//!
//! 位于资源加载器与 NAND/SD 原始扇区读取之间的只读缓存。
//!
//! # 主要组件
//!
//! - [`Slot`] - 单个缓存槽位，包含数据和元数据
//! - [`SizeClass`] - 槽位尺寸类别（小 2 KiB / 大 32 KiB）
//! - [`SlotCache`] - 槽位池 + 最近使用次序，提供 find/allocate/dump
//! - [`CacheConfig`] / [`FillPolicy`] - 构造时配置
//! - [`CacheStats`] - 命中统计
//!
//! # 设计原理
//!
//! 1. **固定内存**：槽位启动时一次分配，永不释放，也不在运行时调整数量
//! 2. **两级尺寸**：短读取用小槽位，批量读取用大槽位，驱逐只在同类中进行
//! 3. **统一对齐**：两类槽位的起点都按小槽位长度的一半（1 KiB）对齐，
//!    附近的大小请求因此可以相互命中
//! 4. **只读**：没有脏块，也没有写回
//!
//! # 性能特性
//!
//! - **查找**: O(槽位数) - 从最近到最久扫描覆盖范围
//! - **提前**: O(1) - `LruCache::promote`
//! - **驱逐**: O(槽位数) - 从最久端找第一个同类槽位

mod slot;
mod slot_cache;

pub use slot::{SizeClass, Slot, SlotFlags};
pub use slot_cache::{CacheStats, SlotCache};

use crate::consts::{DEFAULT_LARGE_SLOTS, DEFAULT_SCRATCH_SECTORS, DEFAULT_SMALL_SLOTS};
use crate::error::{Error, ErrorKind, Result};

/// 槽位填充策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPolicy {
    /// 设备直接读入槽位缓冲区
    #[default]
    Direct,
    /// 先读入中转缓冲区再复制（适用于设备 DMA 只能访问特定内存的场合）
    Scratch,
}

/// 缓存配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// 小槽位数量
    pub small_slots: usize,
    /// 大槽位数量
    pub large_slots: usize,
    /// 填充策略
    pub fill_policy: FillPolicy,
    /// 中转缓冲区大小（扇区数），仅 `FillPolicy::Scratch` 使用
    pub scratch_sectors: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            small_slots: DEFAULT_SMALL_SLOTS,
            large_slots: DEFAULT_LARGE_SLOTS,
            fill_policy: FillPolicy::Direct,
            scratch_sectors: DEFAULT_SCRATCH_SECTORS,
        }
    }
}

impl CacheConfig {
    /// 按可用后备内存（KiB）选择槽位数量
    pub fn for_ram_kib(kib: u32) -> Self {
        let (small_slots, large_slots) = if kib > 6144 {
            (16, 15)
        } else if kib > 2048 {
            (8, 7)
        } else {
            (DEFAULT_SMALL_SLOTS, DEFAULT_LARGE_SLOTS)
        };

        Self {
            small_slots,
            large_slots,
            ..Self::default()
        }
    }

    /// 设置填充策略
    pub fn with_fill_policy(mut self, policy: FillPolicy) -> Self {
        self.fill_policy = policy;
        self
    }

    /// 检查配置
    ///
    /// 每类至少一个槽位；Scratch 策略需要非空中转缓冲区。
    pub fn validate(&self) -> Result<()> {
        if self.small_slots == 0 || self.large_slots == 0 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "Each size class needs at least one slot",
            ));
        }
        if self.fill_policy == FillPolicy::Scratch && self.scratch_sectors == 0 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "Scratch fill policy needs a non-empty scratch buffer",
            ));
        }
        Ok(())
    }

    /// 槽位总内存（字节）
    pub fn pool_bytes(&self) -> usize {
        self.small_slots * SizeClass::Small.len() as usize
            + self.large_slots * SizeClass::Large.len() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_presets() {
        let c = CacheConfig::for_ram_kib(8192);
        assert_eq!((c.small_slots, c.large_slots), (16, 15));
        let c = CacheConfig::for_ram_kib(4096);
        assert_eq!((c.small_slots, c.large_slots), (8, 7));
        let c = CacheConfig::for_ram_kib(2048);
        assert_eq!((c.small_slots, c.large_slots), (4, 1));
        assert_eq!(c.pool_bytes(), 4 * 2048 + 32 * 1024);
    }

    #[test]
    fn test_validate() {
        assert!(CacheConfig::default().validate().is_ok());

        let c = CacheConfig { large_slots: 0, ..CacheConfig::default() };
        assert_eq!(c.validate().unwrap_err().kind(), ErrorKind::InvalidState);

        let c = CacheConfig {
            scratch_sectors: 0,
            ..CacheConfig::default().with_fill_policy(FillPolicy::Scratch)
        };
        assert!(c.validate().is_err());
    }
}
