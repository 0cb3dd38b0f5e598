/*!
    Codec identifiers.
*/

/**
    Identifies the compression format of an encoded stream.

    This is the host-side vocabulary; whether a given codec can
    actually be decoded depends on the transform registry of the
    decode crate.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    // Video
    H264,
    Hevc,
    Mpeg4,
    Msmpeg4v2,
    Vp9,
    // Audio
    Aac,
    Ac3,
    Mp3,
    Flac,
}

impl CodecId {
    /**
        Returns true if this is a video codec.
    */
    pub const fn is_video(self) -> bool {
        matches!(
            self,
            Self::H264 | Self::Hevc | Self::Mpeg4 | Self::Msmpeg4v2 | Self::Vp9
        )
    }

    /**
        Returns true if this is an audio codec.
    */
    pub const fn is_audio(self) -> bool {
        !self.is_video()
    }
}
