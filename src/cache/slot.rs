//! 缓存槽位结构
//!
//! 每个槽位拥有一块固定长度的缓冲区，属于大小两类之一，创建后长度不再改变。

use crate::consts::{ALIGN_UNIT, LARGE_SLOT_SIZE, MAX_CACHED_READ, SMALL_SLOT_SIZE};
use alloc::vec::Vec;
use bitflags::bitflags;

/// 槽位尺寸类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// 小槽位（2 KiB），服务短读取
    Small,
    /// 大槽位（32 KiB），服务批量读取
    Large,
}

impl SizeClass {
    /// 该类槽位的缓冲区长度
    pub const fn len(self) -> u32 {
        match self {
            SizeClass::Small => SMALL_SLOT_SIZE,
            SizeClass::Large => LARGE_SLOT_SIZE,
        }
    }

    /// 为长度为 `len` 的请求选择类别
    ///
    /// 超过 [`MAX_CACHED_READ`] 的请求没有任何槽位能容纳，返回 `None`。
    pub const fn for_request(len: u32) -> Option<Self> {
        if len > MAX_CACHED_READ {
            None
        } else if len <= ALIGN_UNIT {
            Some(SizeClass::Small)
        } else {
            Some(SizeClass::Large)
        }
    }
}

bitflags! {
    /// 槽位标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SlotFlags: u8 {
        /// 缓冲区内容与 `start` 描述的范围一致
        const UPTODATE = 0x01;
    }
}

/// 缓存槽位
///
/// `start` 一旦设置就按 [`ALIGN_UNIT`] 对齐。
/// 只有带 `UPTODATE` 标志的槽位才能被命中，填充失败的槽位不会暴露旧数据。
pub struct Slot {
    /// 缓存范围起始字节偏移
    start: Option<u64>,
    /// 填充该槽位的设备标签
    tag: u8,
    /// 尺寸类别
    class: SizeClass,
    /// 数据缓冲区
    pub(crate) data: Vec<u8>,
    /// 自上次分配以来的命中次数
    hit_count: u32,
    /// 状态标志
    flags: SlotFlags,
}

impl core::fmt::Debug for Slot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Slot")
            .field("start", &self.start)
            .field("tag", &self.tag)
            .field("class", &self.class)
            .field("hit_count", &self.hit_count)
            .field("flags", &self.flags)
            .finish()
    }
}

impl Slot {
    /// 创建空槽位
    pub fn new(class: SizeClass) -> Self {
        Self {
            start: None,
            tag: 0,
            class,
            data: alloc::vec![0u8; class.len() as usize],
            hit_count: 0,
            flags: SlotFlags::empty(),
        }
    }

    /// 起始偏移
    pub fn start_offset(&self) -> Option<u64> {
        self.start
    }

    /// 设备标签
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// 尺寸类别
    pub fn class(&self) -> SizeClass {
        self.class
    }

    /// 缓冲区长度
    pub fn class_len(&self) -> u32 {
        self.class.len()
    }

    /// 命中次数
    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    /// 缓冲区内容
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 是否驻留有效数据
    pub fn is_resident(&self) -> bool {
        self.start.is_some() && self.flags.contains(SlotFlags::UPTODATE)
    }

    /// 是否完整覆盖 `[addr, addr + len)`
    ///
    /// 任一端超出 `u64` 范围时视为不覆盖。
    pub fn covers(&self, tag: u8, addr: u64, len: u32) -> bool {
        match self.start {
            Some(start) if self.is_resident() && self.tag == tag => {
                let slot_end = start.checked_add(self.class_len() as u64);
                let req_end = addr.checked_add(len as u64);
                match (slot_end, req_end) {
                    (Some(slot_end), Some(req_end)) => start <= addr && slot_end >= req_end,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// 请求在缓冲区中的切片
    ///
    /// 调用者必须先确认 [`covers`](Self::covers)。
    pub fn window(&self, addr: u64, len: usize) -> &[u8] {
        let start = self.start.unwrap_or(addr);
        let off = (addr - start) as usize;
        &self.data[off..off + len]
    }

    /// 记录一次命中
    pub(super) fn hit(&mut self) {
        self.hit_count = self.hit_count.saturating_add(1);
    }

    /// 重新指派到新范围，内容待填充
    pub(super) fn assign(&mut self, tag: u8, start: u64) {
        self.start = Some(start);
        self.tag = tag;
        self.hit_count = 0;
        self.flags.remove(SlotFlags::UPTODATE);
    }

    /// 标记填充完成
    pub(super) fn mark_uptodate(&mut self) {
        self.flags.insert(SlotFlags::UPTODATE);
    }

    /// 作废（填充失败时）
    pub(super) fn invalidate(&mut self) {
        self.start = None;
        self.hit_count = 0;
        self.flags.remove(SlotFlags::UPTODATE);
    }
}
