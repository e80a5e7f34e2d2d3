//! 字节级读取实现
//!
//! 把任意 `(addr, len)` 读取转换为缓存拷贝，或在请求无法缓存时转换为
//! 头/中/尾三段无缓冲直读。

use super::{BlockDev, BlockDevice};
use crate::cache::{FillPolicy, SlotCache};
use crate::consts::SECTOR_SIZE;
use crate::error::{Error, ErrorKind, Result};

impl<D: BlockDevice> BlockDev<D> {
    /// 经缓存读取字节
    ///
    /// 1. 有槽位完整覆盖请求：直接拷贝，不访问设备
    /// 2. 否则分配（驱逐）同类中最久未用的槽位，一次设备读填满后拷贝
    /// 3. 请求过大无法缓存：三段直读
    ///
    /// 任何设备读取失败都会中止整个操作，不交付部分结果。
    ///
    /// # 参数
    ///
    /// * `cache` - 共享槽位缓存
    /// * `addr` - 设备上的绝对字节偏移
    /// * `buf` - 目标缓冲区，长度即请求长度（不能为 0）
    pub fn read_cached(&mut self, cache: &mut SlotCache, addr: u64, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "Zero-length read"));
        }
        if addr.checked_add(buf.len() as u64).is_none() {
            return Err(Error::new(ErrorKind::InvalidInput, "Read range overflows"));
        }

        self.inc_read_count();

        // 超过 u32 的长度一定超过槽位容量，按最大值处理即可落到直读路径
        let len = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        let tag = self.tag();

        if let Some(idx) = cache.find(tag, addr, len) {
            buf.copy_from_slice(cache.slot(idx).window(addr, buf.len()));
            return Ok(());
        }

        if let Some(idx) = cache.allocate(tag, addr, len) {
            if let Err(e) = self.fill_slot(cache, idx) {
                cache.invalidate(idx);
                return Err(e);
            }
            cache.mark_filled(idx);
            buf.copy_from_slice(cache.slot(idx).window(addr, buf.len()));
            return Ok(());
        }

        let result = self.read_unbuffered(cache.sector_buf(), addr, buf);
        cache.dump(0);
        result
    }

    /// 从设备填充槽位
    ///
    /// 槽位起点按对齐单元对齐，对齐单元和槽位长度都是扇区的整数倍，
    /// 所以槽位范围本身就是扇区对齐的读取跨度。
    fn fill_slot(&mut self, cache: &mut SlotCache, idx: usize) -> Result<()> {
        let start = cache
            .slot(idx)
            .start_offset()
            .ok_or(Error::new(ErrorKind::InvalidState, "Slot has no start offset"))?;
        let policy = cache.fill_policy();
        let (data, scratch) = cache.fill_parts(idx);
        if start.checked_add(data.len() as u64).is_none() {
            return Err(Error::new(ErrorKind::Io, "Slot range beyond end of device"));
        }

        log::debug!(
            "[CACHE] fill off={:#x} len={} policy={:?}",
            start,
            data.len(),
            policy
        );

        match policy {
            FillPolicy::Direct => self.read_sectors_direct(start, data),
            FillPolicy::Scratch => {
                let mut pos = 0;
                while pos < data.len() {
                    let n = scratch.len().min(data.len() - pos);
                    self.read_sectors_direct(start + pos as u64, &mut scratch[..n])?;
                    data[pos..pos + n].copy_from_slice(&scratch[..n]);
                    pos += n;
                }
                Ok(())
            }
        }
    }

    /// 无缓冲三段直读
    ///
    /// - 头：`addr` 不在扇区边界时，读入所在扇区并拷贝后半部分
    /// - 中：剩余范围完整覆盖的扇区直接读入 `buf` 对应切片
    /// - 尾：结尾不在扇区边界时，读入最后一个扇区并拷贝前半部分
    ///
    /// # 参数
    ///
    /// * `sector_buf` - 一个扇区大小的中转缓冲区
    /// * `addr` - 设备上的绝对字节偏移
    /// * `buf` - 目标缓冲区
    pub fn read_unbuffered(&mut self, sector_buf: &mut [u8], addr: u64, buf: &mut [u8]) -> Result<()> {
        let sector = SECTOR_SIZE as usize;
        if sector_buf.len() < sector {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Sector buffer smaller than one sector",
            ));
        }
        let sector_buf = &mut sector_buf[..sector];

        let mut pos = 0usize;
        let mut off = addr;

        let head = (addr % sector as u64) as usize;
        if head != 0 {
            self.read_sectors_direct(addr - head as u64, sector_buf)?;
            let n = (sector - head).min(buf.len());
            buf[..n].copy_from_slice(&sector_buf[head..head + n]);
            pos += n;
            off += n as u64;
        }

        let whole = (buf.len() - pos) / sector * sector;
        if whole > 0 {
            self.read_sectors_direct(off, &mut buf[pos..pos + whole])?;
            pos += whole;
            off += whole as u64;
        }

        if pos < buf.len() {
            self.read_sectors_direct(off, sector_buf)?;
            let n = buf.len() - pos;
            buf[pos..].copy_from_slice(&sector_buf[..n]);
        }

        log::debug!("[BLOCK] unbuffered read off={:#x} len={}", addr, buf.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::cache::CacheConfig;
    use crate::consts::{LARGE_SLOT_SIZE, MAX_CACHED_READ, SMALL_SLOT_SIZE};
    use alloc::vec;
    use alloc::vec::Vec;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
    }

    fn setup(policy: FillPolicy, scratch_sectors: u32) -> (BlockDev<MemDevice>, SlotCache) {
        let bdev = BlockDev::new(MemDevice::new(pattern(256 * 1024)), 0).unwrap();
        let cache = SlotCache::new(&CacheConfig {
            small_slots: 4,
            large_slots: 1,
            fill_policy: policy,
            scratch_sectors,
        })
        .unwrap();
        (bdev, cache)
    }

    #[test]
    fn test_concrete_scenario() {
        let (mut bdev, mut cache) = setup(FillPolicy::Direct, 64);
        let expected = pattern(256 * 1024);

        // 未命中：驱逐全局最久的小槽位，起点 0x1000
        let mut first = vec![0u8; 100];
        bdev.read_cached(&mut cache, 0x1000, &mut first).unwrap();
        assert_eq!(&first[..], &expected[0x1000..0x1000 + 100]);
        assert_eq!(bdev.device().reads(), &[(0x1000, SMALL_SLOT_SIZE as usize)]);
        assert_eq!(cache.slot(3).start_offset(), Some(0x1000));
        assert_eq!(cache.stats().misses, 1);

        // 命中：结果相同，无设备访问
        let mut second = vec![0u8; 100];
        bdev.read_cached(&mut cache, 0x1000, &mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(bdev.device().reads().len(), 1);
        assert_eq!(cache.stats().hits, 1);

        // 超大请求：总是三段直读
        bdev.device_mut().clear_reads();
        let mut big = vec![0u8; 40000];
        bdev.read_cached(&mut cache, 0x500, &mut big).unwrap();
        assert_eq!(&big[..], &expected[0x500..0x500 + 40000]);
        assert_eq!(
            bdev.device().reads(),
            &[(0x400, 512), (0x600, 39424), (0xa000, 512)]
        );
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(bdev.read_count(), 3);
    }

    #[test]
    fn test_idempotent_hit_for_large_class() {
        let (mut bdev, mut cache) = setup(FillPolicy::Direct, 64);
        let expected = pattern(256 * 1024);

        let mut a = vec![0u8; MAX_CACHED_READ as usize];
        bdev.read_cached(&mut cache, 0x20_3ff, &mut a).unwrap();
        assert_eq!(bdev.device().reads(), &[(0x20_000, LARGE_SLOT_SIZE as usize)]);

        let mut b = vec![0u8; MAX_CACHED_READ as usize];
        bdev.read_cached(&mut cache, 0x20_3ff, &mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..], &expected[0x20_3ff..0x20_3ff + MAX_CACHED_READ as usize]);
        assert_eq!(bdev.physical_read_count(), 1);
    }

    #[test]
    fn test_small_read_served_by_large_slot() {
        let (mut bdev, mut cache) = setup(FillPolicy::Direct, 64);

        let image = pattern(256 * 1024);

        let mut big = vec![0u8; 4096];
        bdev.read_cached(&mut cache, 0x8000, &mut big).unwrap();
        assert_eq!(&big[..], &image[0x8000..0x9000]);

        // 落在大槽位范围内、但在上次读取之外的短读取也直接命中
        let mut small = vec![0u8; 16];
        bdev.read_cached(&mut cache, 0x9000, &mut small).unwrap();
        assert_eq!(bdev.physical_read_count(), 1);
        assert_eq!(&small[..], &image[0x9000..0x9010]);
    }

    #[test]
    fn test_aligned_fallback_has_no_head_or_tail() {
        let (mut bdev, mut cache) = setup(FillPolicy::Direct, 64);
        let mut buf = vec![0u8; 64 * 512];
        bdev.read_cached(&mut cache, 0x1000, &mut buf).unwrap();
        assert_eq!(bdev.device().reads(), &[(0x1000, 64 * 512)]);
    }

    #[test]
    fn test_fallback_head_only() {
        let (mut bdev, mut cache) = setup(FillPolicy::Direct, 64);
        let expected = pattern(256 * 1024);
        // 结尾对齐：头 + 中
        let len = 40000 + 512 - (0x1_0100 + 40000) % 512;
        let mut buf = vec![0u8; len];
        bdev.read_cached(&mut cache, 0x1_0100, &mut buf).unwrap();
        assert_eq!(&buf[..], &expected[0x1_0100..0x1_0100 + len]);
        assert_eq!(bdev.device().reads().len(), 2);
        assert_eq!(bdev.device().reads()[0], (0x1_0000, 512));
    }

    #[test]
    fn test_unbuffered_short_read_inside_one_sector() {
        let (mut bdev, _) = setup(FillPolicy::Direct, 64);
        let expected = pattern(256 * 1024);
        let mut sector = vec![0u8; 512];
        let mut buf = vec![0u8; 10];
        bdev.read_unbuffered(&mut sector, 0x205, &mut buf).unwrap();
        assert_eq!(&buf[..], &expected[0x205..0x20f]);
        assert_eq!(bdev.device().reads(), &[(0x200, 512)]);
    }

    #[test]
    fn test_failed_fill_does_not_expose_stale_data() {
        let (mut bdev, mut cache) = setup(FillPolicy::Direct, 64);

        bdev.device_mut().fail_next_reads(1);
        let mut buf = vec![0u8; 64];
        let err = bdev.read_cached(&mut cache, 0x3000, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(cache.stats().resident_slots, 0);

        // 重试会重新访问设备，而不是命中失败的槽位
        bdev.read_cached(&mut cache, 0x3000, &mut buf).unwrap();
        assert_eq!(bdev.device().reads().len(), 2);
        assert_eq!(&buf[..], &pattern(256 * 1024)[0x3000..0x3040]);
    }

    #[test]
    fn test_fallback_failure_aborts() {
        let (mut bdev, mut cache) = setup(FillPolicy::Direct, 64);
        bdev.device_mut().fail_next_reads(1);
        let mut buf = vec![0u8; 40000];
        assert!(bdev.read_cached(&mut cache, 0x500, &mut buf).is_err());
        assert_eq!(bdev.device().reads().len(), 1);
    }

    #[test]
    fn test_scratch_fill_single_read() {
        let (mut bdev, mut cache) = setup(FillPolicy::Scratch, 64);
        let mut buf = vec![0u8; 2000];
        bdev.read_cached(&mut cache, 0x4400, &mut buf).unwrap();
        assert_eq!(bdev.device().reads(), &[(0x4400, LARGE_SLOT_SIZE as usize)]);
        assert_eq!(&buf[..], &pattern(256 * 1024)[0x4400..0x4400 + 2000]);
    }

    #[test]
    fn test_scratch_fill_chunks_when_scratch_is_small() {
        let (mut bdev, mut cache) = setup(FillPolicy::Scratch, 16);
        let mut buf = vec![0u8; 3000];
        bdev.read_cached(&mut cache, 0x8000, &mut buf).unwrap();
        assert_eq!(
            bdev.device().reads(),
            &[(0x8000, 8192), (0xa000, 8192), (0xc000, 8192), (0xe000, 8192)]
        );
        assert_eq!(&buf[..], &pattern(256 * 1024)[0x8000..0x8000 + 3000]);
    }

    #[test]
    fn test_zero_length_rejected() {
        let (mut bdev, mut cache) = setup(FillPolicy::Direct, 64);
        let err = bdev.read_cached(&mut cache, 0, &mut []).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_reads_near_address_limit_fail_cleanly() {
        for policy in [FillPolicy::Direct, FillPolicy::Scratch] {
            let (mut bdev, mut cache) = setup(policy, 16);
            let mut buf = [0u8; 16];

            let err = bdev.read_cached(&mut cache, u64::MAX - 10, &mut buf).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);

            // 请求本身不越界，但对齐后的槽位末端超出 u64
            let err = bdev.read_cached(&mut cache, u64::MAX - 100, &mut buf).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Io);
            assert!(bdev.device().reads().is_empty());

            bdev.read_cached(&mut cache, 0x100, &mut buf).unwrap();
            assert_eq!(&buf[..], &pattern(256 * 1024)[0x100..0x110]);
        }
    }
}
