//! Numeric ids of the cross-vendor graphics-API format space (VkFormat).
//! KTX2 stores these verbatim in its header.

pub const R8_UNORM: u32 = 9;
pub const R8_SNORM: u32 = 10;
pub const R8G8_UNORM: u32 = 16;
pub const R8G8_SNORM: u32 = 17;
pub const R8G8B8_UNORM: u32 = 23;
pub const R8G8B8_SRGB: u32 = 29;
pub const R8G8B8A8_UNORM: u32 = 37;
pub const R8G8B8A8_SNORM: u32 = 38;
pub const R8G8B8A8_SRGB: u32 = 43;
pub const B8G8R8A8_UNORM: u32 = 44;
pub const B8G8R8A8_SRGB: u32 = 50;
pub const R16_UNORM: u32 = 70;
pub const R16_SFLOAT: u32 = 76;
pub const R16G16_UNORM: u32 = 77;
pub const R16G16_SFLOAT: u32 = 83;
pub const R16G16B16A16_UNORM: u32 = 91;
pub const R16G16B16A16_SFLOAT: u32 = 97;
pub const R32_SFLOAT: u32 = 100;
pub const R32G32_SFLOAT: u32 = 103;
pub const R32G32B32_SFLOAT: u32 = 106;
pub const R32G32B32A32_SFLOAT: u32 = 109;
pub const BC1_RGBA_UNORM_BLOCK: u32 = 133;
pub const BC1_RGBA_SRGB_BLOCK: u32 = 134;
pub const BC2_UNORM_BLOCK: u32 = 135;
pub const BC2_SRGB_BLOCK: u32 = 136;
pub const BC3_UNORM_BLOCK: u32 = 137;
pub const BC3_SRGB_BLOCK: u32 = 138;
pub const BC4_UNORM_BLOCK: u32 = 139;
pub const BC4_SNORM_BLOCK: u32 = 140;
pub const BC5_UNORM_BLOCK: u32 = 141;
pub const BC5_SNORM_BLOCK: u32 = 142;
pub const BC6H_UFLOAT_BLOCK: u32 = 143;
pub const BC6H_SFLOAT_BLOCK: u32 = 144;
pub const BC7_UNORM_BLOCK: u32 = 145;
pub const BC7_SRGB_BLOCK: u32 = 146;
pub const ETC2_R8G8B8_UNORM_BLOCK: u32 = 147;
pub const ETC2_R8G8B8_SRGB_BLOCK: u32 = 148;
pub const ETC2_R8G8B8A8_UNORM_BLOCK: u32 = 151;
pub const ETC2_R8G8B8A8_SRGB_BLOCK: u32 = 152;
pub const EAC_R11_UNORM_BLOCK: u32 = 153;
pub const EAC_R11_SNORM_BLOCK: u32 = 154;
pub const EAC_R11G11_UNORM_BLOCK: u32 = 155;
pub const EAC_R11G11_SNORM_BLOCK: u32 = 156;
pub const ASTC_4X4_UNORM_BLOCK: u32 = 157;
pub const ASTC_4X4_SRGB_BLOCK: u32 = 158;
pub const ASTC_8X8_UNORM_BLOCK: u32 = 171;
pub const ASTC_8X8_SRGB_BLOCK: u32 = 172;
