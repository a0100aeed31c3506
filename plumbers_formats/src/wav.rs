use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use byteorder::{ByteOrder, LittleEndian};
use memmap2::{Mmap, MmapOptions};

const WAVE_FORMAT_PCM: u16 = 1;

/// Stream description pulled from the `fmt ` chunk, plus the location of the
/// sample data within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub data_offset: u64,
    pub data_len: u32,
}

/// A memory-mapped RIFF/WAVE file. The chunk list is walked once at open
/// time to find the `fmt ` and `data` chunks; dialog recordings in the wild
/// mostly put the sample data at offset 0x2C, but nothing guarantees it, so
/// the offset is always taken from the chunk walk.
#[derive(Debug)]
pub struct WavFile {
    path: PathBuf,
    mmap: Mmap,
    info: WavInfo,
}

impl WavFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)
            .with_context(|| format!("opening WAV file at {}", path_buf.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping WAV file {}", path_buf.display()))?;

        let info = parse_wav_info(&mmap)
            .with_context(|| format!("parsing WAV file {}", path_buf.display()))?;

        Ok(WavFile {
            path: path_buf,
            mmap,
            info,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> WavInfo {
        self.info
    }

    /// The PCM sample region.
    pub fn pcm(&self) -> &[u8] {
        let start = self.info.data_offset as usize;
        &self.mmap[start..start + self.info.data_len as usize]
    }
}

fn parse_wav_info(bytes: &[u8]) -> Result<WavInfo> {
    ensure!(bytes.len() >= 12, "file shorter than a RIFF header");
    ensure!(&bytes[0..4] == b"RIFF", "missing RIFF signature");
    ensure!(&bytes[8..12] == b"WAVE", "missing WAVE form type");

    let mut fmt: Option<(u32, u16, u16)> = None;
    let mut data: Option<(u64, u32)> = None;

    let mut offset = 12usize;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = LittleEndian::read_u32(&bytes[offset + 4..offset + 8]) as usize;
        let body = offset + 8;

        if id == b"fmt " {
            ensure!(
                size >= 16 && body + 16 <= bytes.len(),
                "fmt chunk truncated"
            );
            let format_tag = LittleEndian::read_u16(&bytes[body..body + 2]);
            ensure!(
                format_tag == WAVE_FORMAT_PCM,
                "unsupported WAV format tag {format_tag}"
            );
            let channels = LittleEndian::read_u16(&bytes[body + 2..body + 4]);
            let sample_rate = LittleEndian::read_u32(&bytes[body + 4..body + 8]);
            let bits_per_sample = LittleEndian::read_u16(&bytes[body + 14..body + 16]);
            fmt = Some((sample_rate, channels, bits_per_sample));
        } else if id == b"data" {
            // A stated size that runs past the file is trimmed to what is
            // actually there.
            let available = bytes.len().saturating_sub(body);
            data = Some((body as u64, size.min(available) as u32));
        }

        if fmt.is_some() && data.is_some() {
            break;
        }

        // Chunks are word-aligned; odd sizes carry a pad byte.
        offset = body + size + (size & 1);
    }

    let Some((sample_rate, channels, bits_per_sample)) = fmt else {
        bail!("no fmt chunk found");
    };
    let Some((data_offset, data_len)) = data else {
        bail!("no data chunk found");
    };

    Ok(WavInfo {
        sample_rate,
        channels,
        bits_per_sample,
        data_offset,
        data_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fmt_chunk(sample_rate: u32, channels: u16, bits: u16) -> Vec<u8> {
        let block_align = channels * bits / 8;
        let mut chunk = Vec::new();
        chunk.extend_from_slice(b"fmt ");
        chunk.extend_from_slice(&16u32.to_le_bytes());
        chunk.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
        chunk.extend_from_slice(&channels.to_le_bytes());
        chunk.extend_from_slice(&sample_rate.to_le_bytes());
        chunk.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        chunk.extend_from_slice(&block_align.to_le_bytes());
        chunk.extend_from_slice(&bits.to_le_bytes());
        chunk
    }

    fn wav_bytes(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body_len: usize = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&((body_len + 4) as u32).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        for chunk in chunks {
            bytes.extend_from_slice(chunk);
        }
        bytes
    }

    fn data_chunk(pcm: &[u8]) -> Vec<u8> {
        let mut chunk = Vec::new();
        chunk.extend_from_slice(b"data");
        chunk.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
        chunk.extend_from_slice(pcm);
        chunk
    }

    #[test]
    fn parses_canonical_layout() {
        let pcm: Vec<u8> = (0..8).collect();
        let bytes = wav_bytes(&[fmt_chunk(11025, 2, 16), data_chunk(&pcm)]);
        let info = parse_wav_info(&bytes).expect("parse succeeds");
        assert_eq!(info.sample_rate, 11025);
        assert_eq!(info.channels, 2);
        assert_eq!(info.bits_per_sample, 16);
        // The canonical layout everyone assumes: data right after fmt.
        assert_eq!(info.data_offset, 0x2C);
        assert_eq!(info.data_len, 8);
    }

    #[test]
    fn walks_past_extra_chunks_to_find_data() {
        let mut list = Vec::new();
        list.extend_from_slice(b"LIST");
        list.extend_from_slice(&5u32.to_le_bytes());
        list.extend_from_slice(b"INFOx");
        list.push(0); // pad to even length

        let pcm = [1u8, 2, 3, 4];
        let bytes = wav_bytes(&[fmt_chunk(22050, 1, 8), list, data_chunk(&pcm)]);
        let info = parse_wav_info(&bytes).expect("parse succeeds");
        assert_ne!(info.data_offset, 0x2C);
        assert_eq!(info.data_len, 4);
        let start = info.data_offset as usize;
        assert_eq!(&bytes[start..start + 4], &pcm);
    }

    #[test]
    fn rejects_non_wave_files() {
        assert!(parse_wav_info(b"RIFX....WAVE").is_err());
        let no_data = wav_bytes(&[fmt_chunk(11025, 2, 16)]);
        assert!(parse_wav_info(&no_data).is_err());
    }

    #[test]
    fn overlong_data_size_is_trimmed_to_the_file() {
        let mut chunk = Vec::new();
        chunk.extend_from_slice(b"data");
        chunk.extend_from_slice(&100u32.to_le_bytes());
        chunk.extend_from_slice(&[9u8, 9]);
        let bytes = wav_bytes(&[fmt_chunk(11025, 2, 16), chunk]);
        let info = parse_wav_info(&bytes).expect("parse succeeds");
        assert_eq!(info.data_len, 2);
    }

    #[test]
    fn open_maps_the_pcm_region() {
        let pcm: Vec<u8> = (10..26).collect();
        let bytes = wav_bytes(&[fmt_chunk(11025, 2, 16), data_chunk(&pcm)]);

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let wav = WavFile::open(file.path()).expect("open succeeds");
        assert_eq!(wav.info().sample_rate, 11025);
        assert_eq!(wav.pcm(), &pcm[..]);
    }
}
