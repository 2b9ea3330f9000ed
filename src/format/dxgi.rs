//! Numeric ids of the DXGI format space (the swap-chain/container space
//! used by DDS and the presentation layer). Only the ids the descriptor
//! table references are listed; values follow the DXGI_FORMAT enum.

pub const R32G32B32A32_FLOAT: u32 = 2;
pub const R32G32B32_FLOAT: u32 = 6;
pub const R16G16B16A16_FLOAT: u32 = 10;
pub const R16G16B16A16_UNORM: u32 = 11;
pub const R32G32_FLOAT: u32 = 16;
pub const R8G8B8A8_UNORM: u32 = 28;
pub const R8G8B8A8_UNORM_SRGB: u32 = 29;
pub const R8G8B8A8_SNORM: u32 = 31;
pub const R16G16_FLOAT: u32 = 34;
pub const R16G16_UNORM: u32 = 35;
pub const R32_FLOAT: u32 = 41;
pub const R8G8_UNORM: u32 = 49;
pub const R8G8_SNORM: u32 = 51;
pub const R16_FLOAT: u32 = 54;
pub const R16_UNORM: u32 = 56;
pub const R8_UNORM: u32 = 61;
pub const R8_SNORM: u32 = 63;
pub const BC1_UNORM: u32 = 71;
pub const BC1_UNORM_SRGB: u32 = 72;
pub const BC2_UNORM: u32 = 74;
pub const BC2_UNORM_SRGB: u32 = 75;
pub const BC3_UNORM: u32 = 77;
pub const BC3_UNORM_SRGB: u32 = 78;
pub const BC4_UNORM: u32 = 80;
pub const BC4_SNORM: u32 = 81;
pub const BC5_UNORM: u32 = 83;
pub const BC5_SNORM: u32 = 84;
pub const B8G8R8A8_UNORM: u32 = 87;
pub const B8G8R8A8_UNORM_SRGB: u32 = 91;
pub const BC6H_UF16: u32 = 95;
pub const BC6H_SF16: u32 = 96;
pub const BC7_UNORM: u32 = 98;
pub const BC7_UNORM_SRGB: u32 = 99;
