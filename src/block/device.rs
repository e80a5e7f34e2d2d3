//! 块设备核心类型

use crate::consts::{SECTOR_SHIFT, SECTOR_SIZE};
use crate::error::{Error, ErrorKind, Result};
use alloc::boxed::Box;

/// 块设备接口
///
/// 实现此 trait 以提供底层扇区读取（NAND、SD 卡、NOR 等）。
/// 本层传入的 `offset` 和 `buf.len()` 总是 [`sector_size`](Self::sector_size)
/// 的整数倍，物理扇区的换算由实现负责。
///
/// # 示例
///
/// ```rust,ignore
/// use sdfs_core::{BlockDevice, Result};
///
/// struct SpiNand {
///     // ...
/// }
///
/// impl BlockDevice for SpiNand {
///     fn read_sectors(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
///         // offset >> 9 即扇区号
///         Ok(())
///     }
/// }
/// ```
pub trait BlockDevice {
    /// 物理扇区大小（通常 512）
    fn sector_size(&self) -> u32 {
        SECTOR_SIZE
    }

    /// 读取扇区
    ///
    /// # 参数
    ///
    /// * `offset` - 字节偏移（扇区对齐）
    /// * `buf` - 目标缓冲区（长度为扇区大小的整数倍）
    ///
    /// 失败直接返回错误，本层不做重试（ECC/重试由更底层负责）。
    fn read_sectors(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// 设备名（仅用于日志）
    fn name(&self) -> &str {
        "blockdev"
    }
}

impl<T: BlockDevice + ?Sized> BlockDevice for Box<T> {
    fn sector_size(&self) -> u32 {
        (**self).sector_size()
    }

    fn read_sectors(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read_sectors(offset, buf)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// 块设备包装器
///
/// 在 [`BlockDevice`] 之上提供扇区对齐检查和读取统计，
/// 字节级读取（经缓存或三段直读）在 `io.rs` 中实现。
///
/// BlockDev 本身不包含内部锁，由上层 [`Sdfs`](crate::fs::Sdfs)
/// 的单把互斥锁统一保护。
pub struct BlockDev<D> {
    /// 底层设备
    device: D,
    /// 缓存标签：区分不同设备填充的槽位
    tag: u8,
    /// 逻辑读取次数（包括缓存命中）
    read_count: u64,
    /// 物理读取次数（实际设备操作）
    physical_read_count: u64,
}

impl<D: BlockDevice> BlockDev<D> {
    /// 创建新的块设备包装器
    ///
    /// 扇区大小必须与 [`SECTOR_SIZE`] 一致，槽位长度与对齐单元都按它设计。
    pub fn new(device: D, tag: u8) -> Result<Self> {
        if device.sector_size() != SECTOR_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Device sector size must be 512 bytes",
            ));
        }

        Ok(Self {
            device,
            tag,
            read_count: 0,
            physical_read_count: 0,
        })
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 获取底层设备的可变引用
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 取回底层设备
    pub fn into_inner(self) -> D {
        self.device
    }

    /// 缓存标签
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// 获取逻辑读取次数（包括缓存命中）
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// 获取物理读取次数（实际设备操作）
    pub fn physical_read_count(&self) -> u64 {
        self.physical_read_count
    }

    /// 增加读计数
    pub(super) fn inc_read_count(&mut self) {
        self.read_count += 1;
    }

    /// 直接读取扇区（绕过缓存）
    ///
    /// # 参数
    ///
    /// * `offset` - 字节偏移，必须扇区对齐
    /// * `buf` - 目标缓冲区，长度必须是扇区大小的整数倍
    pub fn read_sectors_direct(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let sector = SECTOR_SIZE as u64;
        if offset % sector != 0 || buf.len() as u64 % sector != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Device read must be sector aligned",
            ));
        }
        if buf.is_empty() {
            return Ok(());
        }

        self.physical_read_count += 1;
        log::trace!(
            "[BLOCK] {} read sector={} count={}",
            self.device.name(),
            offset >> SECTOR_SHIFT,
            buf.len() >> SECTOR_SHIFT
        );
        self.device.read_sectors(offset, buf).map_err(|e| {
            log::warn!(
                "[BLOCK] {} read failed off={:#x} len={}: {}",
                self.device.name(),
                offset,
                buf.len(),
                e
            );
            e
        })
    }
}

impl<D> core::fmt::Debug for BlockDev<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockDev")
            .field("tag", &self.tag)
            .field("read_count", &self.read_count)
            .field("physical_read_count", &self.physical_read_count)
            .finish()
    }
}
