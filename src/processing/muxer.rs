use std::time::Duration;
use log::{debug, warn};
use crate::processing::audio::{aac_tag_header, AacPacketType};
use crate::processing::format::{AudioFormat, AudioFrame, VideoFormat, VideoFrame};
use crate::processing::video::{avc_tag_header, AvcPacketType, FrameType};
use crate::utils::duration_delta_ms;
use crate::{Error, Result};

/// An FLV tag body ready to become an RTMP audio or video message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxedTag {
    pub payload: Vec<u8>,

    /// Milliseconds since the previous tag of the same kind
    pub timestamp: u32,
}

/// Last timestamp seen for one media kind
#[derive(Debug, Default)]
struct DeltaTracker {
    previous: Option<Duration>,
}

impl DeltaTracker {
    /// Delta to `at`, without recording it. The first delta is 0.
    fn delta(&self, at: Duration) -> Result<u32> {
        let Some(previous) = self.previous else {
            return Ok(0);
        };
        let delta = duration_delta_ms(previous, at);
        u32::try_from(delta).map_err(|_| {
            Error::timestamp(format!(
                "Timestamp moved backwards by {} ms ({:?} after {:?})",
                -delta, at, previous
            ))
        })
    }

    fn advance(&mut self, at: Duration) {
        self.previous = Some(at);
    }
}

/// Wraps H.264 and AAC access units in FLV tag bodies.
///
/// Emits a sequence header before the first access unit of each kind and
/// again whenever the reported format changes. Tag timestamps are deltas.
#[derive(Debug, Default)]
pub struct FlvMuxer {
    video: DeltaTracker,
    audio: DeltaTracker,
    video_format: Option<VideoFormat>,
    audio_format: Option<AudioFormat>,
}

impl FlvMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mux one video access unit. Returns the sequence header first when
    /// one is due. Nothing changes if the timestamp is rejected.
    pub fn mux_video(&mut self, frame: &VideoFrame) -> Result<Vec<MuxedTag>> {
        let decode_time = frame.dts.unwrap_or(frame.pts);
        let delta = self.video.delta(decode_time)?;

        let mut tags = Vec::with_capacity(2);
        match (&frame.format, &self.video_format) {
            (Some(format), Some(current)) if format == current => {}
            (Some(format), _) => {
                debug!("Video format {}x{}, sending AVC sequence header", format.width, format.height);
                tags.push(MuxedTag {
                    payload: avc_sequence_header(format),
                    timestamp: 0,
                });
            }
            (None, Some(_)) => {}
            (None, None) => {
                return Err(Error::media("First video frame carries no format description"));
            }
        }

        let composition_time = match frame.dts {
            Some(dts) => duration_delta_ms(dts, frame.pts),
            None => 0,
        };
        let composition_time = i32::try_from(composition_time)
            .ok()
            .filter(|cts| (-0x80_0000..0x80_0000).contains(cts))
            .ok_or_else(|| Error::timestamp(format!("Composition time {} ms out of range", composition_time)))?;

        let frame_type = if frame.keyframe {
            FrameType::Keyframe
        } else {
            FrameType::InterFrame
        };
        let mut payload = Vec::with_capacity(5 + frame.data.len());
        payload.extend_from_slice(&avc_tag_header(frame_type, AvcPacketType::Nalu, composition_time));
        payload.extend_from_slice(&frame.data);
        tags.push(MuxedTag { payload, timestamp: delta });

        if let Some(format) = &frame.format {
            self.video_format = Some(format.clone());
        }
        self.video.advance(decode_time);
        Ok(tags)
    }

    /// Mux one AAC access unit, preceded by the sequence header when due
    pub fn mux_audio(&mut self, frame: &AudioFrame) -> Result<Vec<MuxedTag>> {
        let delta = self.audio.delta(frame.pts)?;

        let mut tags = Vec::with_capacity(2);
        match (frame.format, self.audio_format) {
            (Some(format), Some(current)) if format == current => {}
            (Some(format), _) => {
                let config = format.specific_config()?;
                debug!("Audio format {:?}, sending AAC sequence header", format);
                let mut payload = aac_tag_header(AacPacketType::SequenceHeader).to_vec();
                payload.extend_from_slice(&config.to_bytes());
                tags.push(MuxedTag { payload, timestamp: 0 });
            }
            (None, Some(_)) => {}
            (None, None) => {
                return Err(Error::media("First audio frame carries no format description"));
            }
        }

        let mut payload = Vec::with_capacity(2 + frame.data.len());
        payload.extend_from_slice(&aac_tag_header(AacPacketType::Raw));
        payload.extend_from_slice(&frame.data);
        tags.push(MuxedTag { payload, timestamp: delta });

        if frame.format.is_some() {
            self.audio_format = frame.format;
        }
        self.audio.advance(frame.pts);
        Ok(tags)
    }

    /// Forget all state, as for a new session
    pub fn reset(&mut self) {
        if self.video_format.is_some() || self.audio_format.is_some() {
            warn!("Resetting muxer; sequence headers will be resent");
        }
        *self = Self::default();
    }
}

fn avc_sequence_header(format: &VideoFormat) -> Vec<u8> {
    let mut payload = Vec::with_capacity(5 + format.decoder_config.len());
    payload.extend_from_slice(&avc_tag_header(FrameType::Keyframe, AvcPacketType::SequenceHeader, 0));
    payload.extend_from_slice(&format.decoder_config);
    payload
}
