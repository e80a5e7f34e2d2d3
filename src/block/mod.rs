//! 块设备抽象
//!
//! 提供块设备接口和字节级读取。
//! block/device.rs 提供扇区读取接口和包装器（对齐检查、读取统计）
//!
//! block/io.rs 提供经缓存的字节读取：命中直接拷贝，未命中驱逐并填充槽位，
//! 请求过大时走头/中/尾三段直读

mod device;
mod io;

#[cfg(any(test, feature = "mem"))]
mod mem;

pub use device::{BlockDev, BlockDevice};

#[cfg(any(test, feature = "mem"))]
pub use mem::MemDevice;
