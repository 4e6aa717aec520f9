use crate::error::{SketchError, SketchResult};

/// Storage precision of a texture.
///
/// 16-bit formats are stored as half floats (`R16Float`, `Rg16Float`,
/// `Rgba16Float`): normalized 16-bit storage is not renderable without an
/// optional device feature, and half floats cover the same `[0, 1]` range
/// with more headroom.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum InternalFormat {
    R8,
    RG8,
    RGBA8,
    R16,
    RG16,
    RGBA16,
    R32F,
    RG32F,
    RGBA32F,
}

/// Channels stored per texel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Channels {
    R,
    RG,
    RGB,
    RGBA,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::R => 1,
            Channels::RG => 2,
            Channels::RGB => 3,
            Channels::RGBA => 4,
        }
    }
}

/// Type of the texel data uploaded by user code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TexelType {
    U8,
    U16,
    F16,
    F32,
}

impl TexelType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            TexelType::U8 => 1,
            TexelType::U16 | TexelType::F16 => 2,
            TexelType::F32 => 4,
        }
    }
}

/// `{internal_format, channels, texel_type}` triple describing a texture.
///
/// Only combinations the GPU accepts can be built: use [`TextureLayout::new`],
/// which validates, or one of the presets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureLayout {
    internal_format: InternalFormat,
    channels: Channels,
    texel_type: TexelType,
}

impl TextureLayout {
    /// The default for canvases: half-float RGBA storage, 8-bit uploads.
    pub const CANVAS: TextureLayout = TextureLayout {
        internal_format: InternalFormat::RGBA16,
        channels: Channels::RGBA,
        texel_type: TexelType::U8,
    };

    /// 8-bit RGBA, used for the window target and decoded images.
    pub const RGBA8: TextureLayout = TextureLayout {
        internal_format: InternalFormat::RGBA8,
        channels: Channels::RGBA,
        texel_type: TexelType::U8,
    };

    pub fn new(
        internal_format: InternalFormat,
        channels: Channels,
        texel_type: TexelType,
    ) -> SketchResult<Self> {
        use InternalFormat::*;

        let expected = match internal_format {
            R8 | R16 | R32F => Channels::R,
            RG8 | RG16 | RG32F => Channels::RG,
            RGBA8 | RGBA16 | RGBA32F => Channels::RGBA,
        };
        if channels == Channels::RGB {
            return Err(SketchError::invalid(
                "RGB textures are not renderable, use RGBA",
            ));
        }
        if channels != expected {
            return Err(SketchError::invalid(format!(
                "{internal_format:?} stores {expected:?} texels, not {channels:?}"
            )));
        }

        let type_ok = match internal_format {
            R8 | RG8 | RGBA8 => texel_type == TexelType::U8,
            R16 | RG16 | RGBA16 => {
                matches!(texel_type, TexelType::U8 | TexelType::U16 | TexelType::F16)
            }
            R32F | RG32F | RGBA32F => matches!(texel_type, TexelType::F16 | TexelType::F32),
        };
        if !type_ok {
            return Err(SketchError::invalid(format!(
                "{internal_format:?} cannot be uploaded as {texel_type:?}"
            )));
        }

        Ok(Self {
            internal_format,
            channels,
            texel_type,
        })
    }

    #[inline]
    pub fn internal_format(&self) -> InternalFormat {
        self.internal_format
    }

    #[inline]
    pub fn channels(&self) -> Channels {
        self.channels
    }

    #[inline]
    pub fn texel_type(&self) -> TexelType {
        self.texel_type
    }

    /// Bytes of one uploaded texel.
    pub fn upload_texel_size(&self) -> usize {
        self.channels.count() * self.texel_type.size_in_bytes()
    }

    pub fn wgpu_format(&self) -> wgpu::TextureFormat {
        use wgpu::TextureFormat as F;
        match self.internal_format {
            InternalFormat::R8 => F::R8Unorm,
            InternalFormat::RG8 => F::Rg8Unorm,
            InternalFormat::RGBA8 => F::Rgba8Unorm,
            InternalFormat::R16 => F::R16Float,
            InternalFormat::RG16 => F::Rg16Float,
            InternalFormat::RGBA16 => F::Rgba16Float,
            InternalFormat::R32F => F::R32Float,
            InternalFormat::RG32F => F::Rg32Float,
            InternalFormat::RGBA32F => F::Rgba32Float,
        }
    }
}

impl Default for TextureLayout {
    fn default() -> Self {
        Self::CANVAS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── accepted combinations ─────────────────────────────────────────────

    #[test]
    fn presets_are_valid() {
        for preset in [TextureLayout::CANVAS, TextureLayout::RGBA8] {
            let rebuilt = TextureLayout::new(
                preset.internal_format(),
                preset.channels(),
                preset.texel_type(),
            )
            .unwrap();
            assert_eq!(rebuilt, preset);
        }
    }

    #[test]
    fn half_float_storage_accepts_integer_and_half_uploads() {
        for t in [TexelType::U8, TexelType::U16, TexelType::F16] {
            assert!(TextureLayout::new(InternalFormat::RGBA16, Channels::RGBA, t).is_ok());
        }
    }

    #[test]
    fn formats_map_to_expected_wgpu_formats() {
        let l = TextureLayout::new(InternalFormat::RG32F, Channels::RG, TexelType::F32).unwrap();
        assert_eq!(l.wgpu_format(), wgpu::TextureFormat::Rg32Float);
        assert_eq!(TextureLayout::CANVAS.wgpu_format(), wgpu::TextureFormat::Rgba16Float);
        assert_eq!(l.upload_texel_size(), 8);
    }

    // ── rejected combinations ─────────────────────────────────────────────

    #[test]
    fn rgb_is_rejected() {
        let err = TextureLayout::new(InternalFormat::RGBA8, Channels::RGB, TexelType::U8);
        assert!(matches!(err, Err(SketchError::InvalidArgument(_))));
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        assert!(TextureLayout::new(InternalFormat::R8, Channels::RGBA, TexelType::U8).is_err());
        assert!(TextureLayout::new(InternalFormat::RGBA16, Channels::RG, TexelType::U8).is_err());
    }

    #[test]
    fn texel_type_wider_than_storage_is_rejected() {
        assert!(TextureLayout::new(InternalFormat::RGBA8, Channels::RGBA, TexelType::F32).is_err());
        assert!(TextureLayout::new(InternalFormat::R32F, Channels::R, TexelType::U8).is_err());
    }
}
