/*!
    Pixel formats, sample formats, and colorimetry descriptions.
*/

/**
    Pixel formats for decoded video frames.

    Only formats the supported transforms can emit are listed. Frame
    buffers are tightly packed per plane: plane `i + 1` starts right
    after the last row of plane `i`.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, three planes, 8 bits per component.
    Yuv420p,
    /// Biplanar YUV 4:2:0, luma plane plus interleaved chroma plane.
    Nv12,
    /// Biplanar YUV 4:2:0, 10 bits per component stored in 16-bit words.
    P010,
    /// Packed YUV 4:2:2, single plane, Y0 U Y1 V byte order.
    Yuyv422,
}

impl PixelFormat {
    /**
        Returns the number of planes in a frame of this format.
    */
    pub const fn plane_count(self) -> usize {
        match self {
            Self::Yuv420p => 3,
            Self::Nv12 | Self::P010 => 2,
            Self::Yuyv422 => 1,
        }
    }

    /**
        Returns the number of bytes in one row of the given plane, for a
        frame `width` pixels wide.
    */
    pub const fn row_bytes(self, plane: usize, width: u32) -> usize {
        let w = width as usize;
        match (self, plane) {
            (Self::Yuv420p, 0) => w,
            (Self::Yuv420p, _) => w.div_ceil(2),
            (Self::Nv12, 0) => w,
            (Self::Nv12, _) => w.div_ceil(2) * 2,
            (Self::P010, 0) => w * 2,
            (Self::P010, _) => w.div_ceil(2) * 4,
            (Self::Yuyv422, _) => w.div_ceil(2) * 4,
        }
    }

    /**
        Returns the number of rows in the given plane, for a frame
        `height` pixels tall.
    */
    pub const fn plane_rows(self, plane: usize, height: u32) -> usize {
        let h = height as usize;
        match (self, plane) {
            (Self::Yuv420p | Self::Nv12 | Self::P010, 0) => h,
            (Self::Yuv420p | Self::Nv12 | Self::P010, _) => h.div_ceil(2),
            (Self::Yuyv422, _) => h,
        }
    }

    /**
        Returns the byte offset of the given plane within a tightly
        packed frame buffer of the given dimensions.
    */
    pub const fn plane_offset(self, plane: usize, width: u32, height: u32) -> usize {
        let mut offset = 0;
        let mut p = 0;
        while p < plane {
            offset += self.row_bytes(p, width) * self.plane_rows(p, height);
            p += 1;
        }
        offset
    }

    /**
        Returns the total byte size of a tightly packed frame buffer of
        the given dimensions.
    */
    pub const fn buffer_size(self, width: u32, height: u32) -> usize {
        self.plane_offset(self.plane_count(), width, height)
    }
}

/**
    Sample formats for decoded audio frames.

    All formats are interleaved (samples for all channels stored
    together per frame position).
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SampleFormat {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 16-bit integer.
    S16,
    /// Signed 32-bit integer.
    S32,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

impl SampleFormat {
    /**
        Returns the number of bytes per sample (single channel).
    */
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /**
        Returns true if this is a floating point format.
    */
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/**
    YUV to RGB conversion matrix of a decoded frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorMatrix {
    Bt709,
    Bt470bg,
    Smpte240m,
}

/**
    Color primaries of a decoded frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorPrimaries {
    Bt709,
    Bt470m,
    Bt470bg,
    Smpte170m,
    Smpte240m,
}

/**
    Transfer function (gamma curve) of a decoded frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TransferFunction {
    Linear,
    Gamma22,
    Gamma28,
    Bt709,
    Smpte240m,
    Srgb,
}

/**
    Chroma sample siting of a decoded frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChromaSiting {
    /// Chroma centered between luma samples (MPEG-1 style).
    Center,
    /// Chroma horizontally aligned with luma samples (MPEG-2 style).
    Left,
}

/**
    Quantization range of a decoded frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorRange {
    /// Full 0..255 range.
    Full,
    /// Limited 16..235 range.
    Limited,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuv420p_geometry() {
        let f = PixelFormat::Yuv420p;
        assert_eq!(f.plane_count(), 3);
        assert_eq!(f.row_bytes(0, 640), 640);
        assert_eq!(f.row_bytes(1, 640), 320);
        assert_eq!(f.plane_rows(0, 480), 480);
        assert_eq!(f.plane_rows(2, 480), 240);
        assert_eq!(f.plane_offset(1, 640, 480), 640 * 480);
        assert_eq!(f.buffer_size(640, 480), 640 * 480 * 3 / 2);
    }

    #[test]
    fn biplanar_geometry() {
        assert_eq!(PixelFormat::Nv12.plane_count(), 2);
        assert_eq!(PixelFormat::Nv12.buffer_size(640, 480), 640 * 480 * 3 / 2);
        assert_eq!(PixelFormat::P010.buffer_size(640, 480), 640 * 480 * 3);
        // chroma plane of NV12 interleaves U and V, full width
        assert_eq!(PixelFormat::Nv12.row_bytes(1, 640), 640);
    }

    #[test]
    fn packed_geometry() {
        assert_eq!(PixelFormat::Yuyv422.plane_count(), 1);
        assert_eq!(PixelFormat::Yuyv422.buffer_size(640, 480), 640 * 480 * 2);
    }

    #[test]
    fn odd_dimensions_round_up() {
        let f = PixelFormat::Yuv420p;
        assert_eq!(f.row_bytes(1, 641), 321);
        assert_eq!(f.plane_rows(1, 481), 241);
        assert_eq!(PixelFormat::Yuyv422.row_bytes(0, 3), 8);
    }

    #[test]
    fn sample_format_properties() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::S32.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);

        assert!(SampleFormat::F32.is_float());
        assert!(SampleFormat::F64.is_float());
        assert!(!SampleFormat::S32.is_float());
    }
}
