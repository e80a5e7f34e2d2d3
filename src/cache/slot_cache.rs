//! 槽位池与最近使用次序
//!
//! 所有槽位在构造时一次性分配，之后只原地改写。最近使用次序用 `lru` crate
//! 维护：键是槽位下标，`promote` 为 O(1) 提前，`iter()` 从最近到最久遍历，
//! `iter().rev()` 从最久到最近遍历。
//!
//! # 架构
//!
//! ```text
//! struct SlotCache {
//!     slots: Vec<Slot>,               // 小槽位在前，大槽位在后
//!     recency: LruCache<usize, ()>,   // 覆盖全部槽位，各出现一次
//!     stats: CacheStats,              // 全局命中/未命中计数
//!     scratch: Vec<u8>,               // 填充中转缓冲区（Scratch 策略）
//!     sector_buf: Vec<u8>,            // 三段直读的头/尾扇区缓冲区
//! }
//! ```

use super::slot::{SizeClass, Slot};
use super::{CacheConfig, FillPolicy};
use crate::consts::{ALIGN_UNIT, MAX_CACHED_READ, SECTOR_SIZE};
use crate::error::{Error, ErrorKind, Result};
use alloc::vec::Vec;
use core::num::NonZeroUsize;
use lru::LruCache;

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 缓存命中次数
    pub hits: u32,
    /// 缓存未命中（分配）次数
    pub misses: u32,
    /// 当前驻留的槽位数
    pub resident_slots: usize,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits as u64 + self.misses as u64;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// 整数百分比命中率
    pub fn hit_percent(&self) -> u32 {
        let total = self.hits as u64 + self.misses as u64;
        if total == 0 {
            0
        } else {
            (self.hits as u64 * 100 / total) as u32
        }
    }
}

/// 两级槽位读缓存
pub struct SlotCache {
    slots: Vec<Slot>,
    recency: LruCache<usize, ()>,
    stats: CacheStats,
    /// 上一次报告的命中率百分比
    last_reported: u32,
    policy: FillPolicy,
    scratch: Vec<u8>,
    sector_buf: Vec<u8>,
}

impl SlotCache {
    /// 按配置创建缓存
    ///
    /// 初始次序：0 号槽位最近，最后一个大槽位最久。
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let total = config.small_slots + config.large_slots;
        let cap = NonZeroUsize::new(total)
            .ok_or(Error::new(ErrorKind::InvalidState, "Cache needs at least one slot"))?;

        let mut slots = Vec::with_capacity(total);
        slots.extend((0..config.small_slots).map(|_| Slot::new(SizeClass::Small)));
        slots.extend((0..config.large_slots).map(|_| Slot::new(SizeClass::Large)));

        let mut recency = LruCache::new(cap);
        for idx in (0..total).rev() {
            recency.put(idx, ());
        }

        let scratch = match config.fill_policy {
            FillPolicy::Direct => Vec::new(),
            FillPolicy::Scratch => {
                alloc::vec![0u8; config.scratch_sectors as usize * SECTOR_SIZE as usize]
            }
        };

        log::debug!(
            "[CACHE] init small={} large={} policy={:?}",
            config.small_slots,
            config.large_slots,
            config.fill_policy
        );

        Ok(Self {
            slots,
            recency,
            stats: CacheStats::default(),
            last_reported: 0,
            policy: config.fill_policy,
            scratch,
            sector_buf: alloc::vec![0u8; SECTOR_SIZE as usize],
        })
    }

    /// 查找完整覆盖请求的槽位
    ///
    /// 从最近到最久扫描，命中则计数并把槽位提前到最前。
    pub fn find(&mut self, tag: u8, addr: u64, len: u32) -> Option<usize> {
        if len > MAX_CACHED_READ {
            return None;
        }

        let idx = self
            .recency
            .iter()
            .map(|(idx, _)| *idx)
            .find(|idx| self.slots[*idx].covers(tag, addr, len))?;

        self.stats.hits = self.stats.hits.wrapping_add(1);
        self.slots[idx].hit();
        self.recency.promote(&idx);
        log::trace!("[CACHE] hit off={:#x} len={} slot={}", addr, len, idx);
        Some(idx)
    }

    /// 为请求分配（驱逐）一个槽位
    ///
    /// 从最久到最近扫描，选中第一个所需类别的槽位，设置新的对齐起点，
    /// 计一次未命中并提前到最前。返回的槽位内容待调用者填充。
    /// 请求过大时返回 `None`，调用者应走无缓冲路径。
    pub fn allocate(&mut self, tag: u8, addr: u64, len: u32) -> Option<usize> {
        let class = SizeClass::for_request(len)?;

        let idx = self
            .recency
            .iter()
            .rev()
            .map(|(idx, _)| *idx)
            .find(|idx| self.slots[*idx].class() == class)?;

        let start = addr & !(ALIGN_UNIT as u64 - 1);
        self.stats.misses = self.stats.misses.wrapping_add(1);
        self.slots[idx].assign(tag, start);
        self.recency.promote(&idx);
        log::debug!(
            "[CACHE] miss off={:#x} len={} -> slot={} {:?} start={:#x}",
            addr,
            len,
            idx,
            class,
            start
        );
        Some(idx)
    }

    /// 填充所需的可变视图：`(槽位缓冲区, 中转缓冲区)`
    pub(crate) fn fill_parts(&mut self, idx: usize) -> (&mut [u8], &mut [u8]) {
        (&mut self.slots[idx].data, &mut self.scratch)
    }

    /// 三段直读所用的扇区缓冲区
    pub(crate) fn sector_buf(&mut self) -> &mut [u8] {
        &mut self.sector_buf
    }

    /// 标记填充成功
    pub(crate) fn mark_filled(&mut self, idx: usize) {
        self.slots[idx].mark_uptodate();
    }

    /// 填充失败，作废槽位
    pub(crate) fn invalidate(&mut self, idx: usize) {
        self.slots[idx].invalidate();
    }

    /// 作废某个设备留下的全部槽位（设备被替换或解绑时）
    pub fn invalidate_tag(&mut self, tag: u8) -> usize {
        let mut count = 0;
        for slot in self.slots.iter_mut().filter(|s| s.is_resident() && s.tag() == tag) {
            slot.invalidate();
            count += 1;
        }
        log::debug!("[CACHE] dropped {} slots of device {}", count, tag);
        count
    }

    /// 获取槽位
    pub fn slot(&self, idx: usize) -> &Slot {
        &self.slots[idx]
    }

    /// 槽位总数
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 是否没有槽位（构造保证不会发生）
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 填充策略
    pub fn fill_policy(&self) -> FillPolicy {
        self.policy
    }

    /// 最近使用次序（最近在前）
    pub fn recency_order(&self) -> Vec<usize> {
        self.recency.iter().map(|(idx, _)| *idx).collect()
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats;
        stats.resident_slots = self.slots.iter().filter(|s| s.is_resident()).count();
        stats
    }

    /// 输出诊断信息
    ///
    /// 命中率（整数百分比）与上次报告不同才输出；`level > 0` 时再按最近使用
    /// 次序列出每个驻留槽位。
    pub fn dump(&mut self, level: u32) {
        let ratio = self.stats.hit_percent();
        if ratio != self.last_reported {
            log::info!(
                "[CACHE] hit={}, miss={}, hit-rate={}%",
                self.stats.hits,
                self.stats.misses,
                ratio
            );
            self.last_reported = ratio;
        }

        if level > 0 {
            for (idx, _) in self.recency.iter() {
                let slot = &self.slots[*idx];
                if !slot.is_resident() {
                    continue;
                }
                if let Some(start) = slot.start_offset() {
                    log::info!(
                        "  [{}] off={:#010x}, len={}",
                        slot.hit_count(),
                        start,
                        slot.class_len()
                    );
                }
            }
        }
    }

    /// 上一次报告的命中率百分比
    pub fn last_reported_ratio(&self) -> u32 {
        self.last_reported
    }
}

impl core::fmt::Debug for SlotCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlotCache")
            .field("slots", &self.slots.len())
            .field("policy", &self.policy)
            .field("stats", &self.stats)
            .finish()
    }
}
