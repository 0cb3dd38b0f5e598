/*!
    Attribute bags describing negotiated media types.

    A transform advertises and accepts media types as flat key-value
    bags. `MediaType` models such a bag with typed accessors; `Tag` is
    the opaque 16-byte identifier scheme transforms use for major
    types, subtypes, and unknown attribute keys.
*/

use std::collections::BTreeMap;
use std::fmt;

/**
    An opaque 16-byte identifier.

    Format identifiers commonly embed a 4-byte code (a FourCC for
    video, a wave format code for audio) over a fixed suffix;
    [`Tag::fourcc`] builds one and [`Tag::as_fourcc`] recovers the
    code.
*/
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub [u8; 16]);

const FOURCC_SUFFIX: [u8; 12] = [
    0x00, 0x00, 0x00, 0x10, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

impl Tag {
    /**
        Creates a tag from raw bytes.
    */
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /**
        Creates a tag embedding a 4-byte format code.
    */
    pub const fn fourcc(code: u32) -> Self {
        let c = code.to_le_bytes();
        Self([
            c[0],
            c[1],
            c[2],
            c[3],
            FOURCC_SUFFIX[0],
            FOURCC_SUFFIX[1],
            FOURCC_SUFFIX[2],
            FOURCC_SUFFIX[3],
            FOURCC_SUFFIX[4],
            FOURCC_SUFFIX[5],
            FOURCC_SUFFIX[6],
            FOURCC_SUFFIX[7],
            FOURCC_SUFFIX[8],
            FOURCC_SUFFIX[9],
            FOURCC_SUFFIX[10],
            FOURCC_SUFFIX[11],
        ])
    }

    /**
        Creates a tag embedding a 4-character format code.
    */
    pub const fn fourcc_str(code: &[u8; 4]) -> Self {
        Self::fourcc(u32::from_le_bytes(*code))
    }

    /**
        Extracts the embedded format code, if this tag follows the
        FourCC embedding scheme.
    */
    pub fn as_fourcc(self) -> Option<u32> {
        if self.0[4..16] == FOURCC_SUFFIX {
            Some(u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]))
        } else {
            None
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.as_fourcc() {
            let bytes = code.to_le_bytes();
            if bytes.iter().all(|b| b.is_ascii_graphic()) {
                let s: String = bytes.iter().map(|&b| b as char).collect();
                return write!(f, "Tag({s:?})");
            }
            return write!(f, "Tag({code:#06x})");
        }
        write!(f, "Tag(")?;
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/**
    Well-known format tags.
*/
pub mod tags {
    use super::Tag;

    pub const MAJOR_AUDIO: Tag = Tag::fourcc_str(b"auds");
    pub const MAJOR_VIDEO: Tag = Tag::fourcc_str(b"vids");

    // Video subtypes (compressed)
    pub const VIDEO_H264: Tag = Tag::fourcc_str(b"H264");
    pub const VIDEO_HEVC: Tag = Tag::fourcc_str(b"HEVC");
    pub const VIDEO_MP4V: Tag = Tag::fourcc_str(b"MP4V");
    pub const VIDEO_MP43: Tag = Tag::fourcc_str(b"MP43");
    pub const VIDEO_MP42: Tag = Tag::fourcc_str(b"MP42");

    // Video subtypes (uncompressed)
    pub const VIDEO_NV12: Tag = Tag::fourcc_str(b"NV12");
    pub const VIDEO_P010: Tag = Tag::fourcc_str(b"P010");
    pub const VIDEO_P016: Tag = Tag::fourcc_str(b"P016");
    pub const VIDEO_YUY2: Tag = Tag::fourcc_str(b"YUY2");
    pub const VIDEO_I420: Tag = Tag::fourcc_str(b"I420");
    pub const VIDEO_IYUV: Tag = Tag::fourcc_str(b"IYUV");

    // Audio subtypes (wave format codes)
    pub const AUDIO_PCM: Tag = Tag::fourcc(0x0001);
    pub const AUDIO_FLOAT: Tag = Tag::fourcc(0x0003);
    pub const AUDIO_AAC: Tag = Tag::fourcc(0x1610);
    pub const AUDIO_AC3: Tag = Tag::fourcc(0x2000);
    pub const AUDIO_MP3: Tag = Tag::fourcc(0x0055);
}

/**
    Keys of media type and transform attributes.

    Unrecognized keys are preserved under [`AttrKey::Unknown`] so a
    bag can be copied or dumped without losing entries.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum AttrKey {
    MajorType,
    Subtype,
    // Audio
    SampleRate,
    ChannelCount,
    ChannelMask,
    BitsPerSample,
    BlockAlignment,
    AvgBytesPerSecond,
    PreferWaveFormat,
    AacPayloadType,
    UserData,
    // Video
    FrameSize,
    PixelAspectRatio,
    InterlaceMode,
    AvgBitrate,
    DisplayAperture,
    YuvMatrix,
    ColorPrimaries,
    TransferFunction,
    ChromaSiting,
    NominalRange,
    // Transform-level
    AsyncCapable,
    AsyncUnlock,
    MinOutputSampleCount,
    /// A key this crate has no name for.
    Unknown(Tag),
}

/**
    Values of media type and transform attributes.

    `U64` doubles as a packed pair (two `u32` halves); frame sizes and
    aspect ratios are stored that way.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttrValue {
    U32(u32),
    U64(u64),
    Tag(Tag),
    Blob(Vec<u8>),
    Str(String),
}

/**
    A media type: an ordered attribute bag describing one negotiated
    format.

    An empty bag is a valid starting point; adjustment fills in the
    required keys before the bag is committed to a transform.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaType {
    entries: BTreeMap<AttrKey, AttrValue>,
}

impl MediaType {
    /**
        Creates an empty media type.
    */
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: AttrKey) -> bool {
        self.entries.contains_key(&key)
    }

    /**
        Iterates over all entries in key order.
    */
    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn set(&mut self, key: AttrKey, value: AttrValue) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: AttrKey) -> Option<&AttrValue> {
        self.entries.get(&key)
    }

    pub fn set_u32(&mut self, key: AttrKey, value: u32) {
        self.set(key, AttrValue::U32(value));
    }

    pub fn get_u32(&self, key: AttrKey) -> Option<u32> {
        match self.get(key)? {
            AttrValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn set_u64(&mut self, key: AttrKey, value: u64) {
        self.set(key, AttrValue::U64(value));
    }

    pub fn get_u64(&self, key: AttrKey) -> Option<u64> {
        match self.get(key)? {
            AttrValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    /**
        Stores two `u32` halves packed into one `u64` value, the
        convention for frame sizes and aspect ratios.
    */
    pub fn set_pair(&mut self, key: AttrKey, first: u32, second: u32) {
        self.set_u64(key, (u64::from(first) << 32) | u64::from(second));
    }

    pub fn get_pair(&self, key: AttrKey) -> Option<(u32, u32)> {
        let packed = self.get_u64(key)?;
        Some(((packed >> 32) as u32, packed as u32))
    }

    pub fn set_tag(&mut self, key: AttrKey, value: Tag) {
        self.set(key, AttrValue::Tag(value));
    }

    pub fn get_tag(&self, key: AttrKey) -> Option<Tag> {
        match self.get(key)? {
            AttrValue::Tag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn set_blob(&mut self, key: AttrKey, value: Vec<u8>) {
        self.set(key, AttrValue::Blob(value));
    }

    pub fn get_blob(&self, key: AttrKey) -> Option<&[u8]> {
        match self.get(key)? {
            AttrValue::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn set_str(&mut self, key: AttrKey, value: impl Into<String>) {
        self.set(key, AttrValue::Str(value.into()));
    }

    pub fn get_str(&self, key: AttrKey) -> Option<&str> {
        match self.get(key)? {
            AttrValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn major_type(&self) -> Option<Tag> {
        self.get_tag(AttrKey::MajorType)
    }

    pub fn subtype(&self) -> Option<Tag> {
        self.get_tag(AttrKey::Subtype)
    }

    pub fn is_audio(&self) -> bool {
        self.major_type() == Some(tags::MAJOR_AUDIO)
    }

    pub fn is_video(&self) -> bool {
        self.major_type() == Some(tags::MAJOR_VIDEO)
    }
}

impl fmt::Display for MediaType {
    /// Compact single-line dump for negotiation traces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "(empty)");
        }
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            match (key, value) {
                // pair-packed values read better unpacked
                (
                    AttrKey::FrameSize | AttrKey::PixelAspectRatio,
                    AttrValue::U64(packed),
                ) => {
                    write!(f, "{key:?}={}x{}", packed >> 32, *packed as u32)?;
                }
                (_, AttrValue::U32(v)) => write!(f, "{key:?}={v}")?,
                (_, AttrValue::U64(v)) => write!(f, "{key:?}={v}")?,
                (_, AttrValue::Tag(t)) => write!(f, "{key:?}={t:?}")?,
                (_, AttrValue::Blob(b)) => write!(f, "{key:?}=[{} bytes]", b.len())?,
                (_, AttrValue::Str(s)) => write!(f, "{key:?}={s:?}")?,
            }
        }
        Ok(())
    }
}
