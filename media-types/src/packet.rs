/*!
    Coded media packets.
*/

/**
    Fragment boundaries inside a coded payload.

    For H.264 this records the offset and length of each NAL unit so
    downstream consumers do not have to re-scan for start codes.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentationHeader {
    /// Byte offset of each fragment inside `data`.
    pub offsets: Vec<usize>,
    /// Byte length of each fragment.
    pub lengths: Vec<usize>,
}

impl FragmentationHeader {
    /**
        Returns the number of fragments.
    */
    pub fn count(&self) -> usize {
        self.offsets.len().min(self.lengths.len())
    }
}

/**
    A coded media unit.

    Packets flow into the pipeline from the source stream and out of it from
    encoders. `Clone` performs a deep copy; a cloned packet shares no mutable
    state with the original.
*/
#[derive(Clone, Debug)]
pub struct MediaPacket {
    /// Track the packet belongs to. Input packets carry the source's own
    /// track id; encoded output packets carry an output track id.
    pub track_id: u32,
    /// Presentation timestamp, in track time-base units.
    pub pts: i64,
    /// Decode timestamp, in track time-base units.
    pub dts: i64,
    /// Whether this packet starts a decodable unit on its own.
    pub keyframe: bool,
    /// Coded payload.
    pub data: Vec<u8>,
    /// Optional fragment metadata (NAL boundaries for H.264).
    pub fragments: Option<FragmentationHeader>,
}

impl MediaPacket {
    /**
        Create a new packet with no fragment metadata.
    */
    pub fn new(track_id: u32, pts: i64, dts: i64, data: Vec<u8>) -> Self {
        Self {
            track_id,
            pts,
            dts,
            keyframe: false,
            data,
            fragments: None,
        }
    }

    /**
        Mark the packet as a keyframe.
    */
    pub fn with_keyframe(mut self) -> Self {
        self.keyframe = true;
        self
    }

    /**
        Attach fragment metadata.
    */
    pub fn with_fragments(mut self, fragments: FragmentationHeader) -> Self {
        self.fragments = Some(fragments);
        self
    }
}
