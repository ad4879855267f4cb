use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapNGReader, traits::PcapReaderIterator,
};

use super::{FrameEvent, FrameSource, SourceError};

const READER_CAPACITY: usize = 64 * 1024;
const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

/// Frame source backed by a PCAP or PCAPNG file on disk.
pub struct PcapFileSource {
    format: Format,
}

enum Format {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

impl PcapFileSource {
    /// Open a capture file, sniffing PCAPNG versus legacy PCAP from the
    /// leading magic.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut file = File::open(path)?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        file.seek(SeekFrom::Start(0))?;

        let format = if magic == PCAPNG_MAGIC {
            Format::Ng {
                reader: PcapNGReader::new(READER_CAPACITY, file)
                    .map_err(|e| SourceError::Pcap(e.to_string()))?,
                linktypes: Vec::new(),
            }
        } else {
            Format::Legacy {
                reader: LegacyPcapReader::new(READER_CAPACITY, file)
                    .map_err(|e| SourceError::Pcap(e.to_string()))?,
                linktype: None,
            }
        };

        Ok(Self { format })
    }
}

impl FrameSource for PcapFileSource {
    fn next_frame(&mut self) -> Result<Option<FrameEvent>, SourceError> {
        loop {
            let step = match &mut self.format {
                Format::Legacy { reader, linktype } => {
                    step_reader(reader, |block| legacy_event(block, linktype))?
                }
                Format::Ng { reader, linktypes } => {
                    step_reader(reader, |block| ng_event(block, linktypes))?
                }
            };
            match step {
                Step::Frame(event) => return Ok(Some(event)),
                Step::Skip => {}
                Step::Eof => return Ok(None),
            }
        }
    }
}

enum Step {
    Frame(FrameEvent),
    Skip,
    Eof,
}

fn step_reader<R: PcapReaderIterator>(
    reader: &mut R,
    mut on_block: impl FnMut(&PcapBlockOwned<'_>) -> Option<FrameEvent>,
) -> Result<Step, SourceError> {
    match reader.next() {
        Ok((offset, block)) => {
            let event = on_block(&block);
            reader.consume(offset);
            Ok(event.map_or(Step::Skip, Step::Frame))
        }
        Err(pcap_parser::PcapError::Eof) => Ok(Step::Eof),
        Err(pcap_parser::PcapError::Incomplete(_)) => {
            reader
                .refill()
                .map_err(|e| SourceError::Pcap(e.to_string()))?;
            Ok(Step::Skip)
        }
        Err(e) => Err(SourceError::Pcap(e.to_string())),
    }
}

fn legacy_event(block: &PcapBlockOwned<'_>, linktype: &mut Option<Linktype>) -> Option<FrameEvent> {
    match block {
        PcapBlockOwned::LegacyHeader(header) => {
            *linktype = Some(header.network);
            None
        }
        PcapBlockOwned::Legacy(packet) => Some(FrameEvent {
            ts: Some(f64::from(packet.ts_sec) + f64::from(packet.ts_usec) * 1e-6),
            linktype: linktype.unwrap_or(Linktype::ETHERNET),
            data: packet.data.to_vec(),
        }),
        PcapBlockOwned::NG(_) => None,
    }
}

fn ng_event(block: &PcapBlockOwned<'_>, linktypes: &mut Vec<Linktype>) -> Option<FrameEvent> {
    match block {
        PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
            linktypes.push(intf.linktype);
            None
        }
        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
            let ts = ((u64::from(packet.ts_high)) << 32) | u64::from(packet.ts_low);
            Some(FrameEvent {
                ts: Some(ts as f64 * 1e-6),
                linktype: linktypes
                    .get(packet.if_id as usize)
                    .copied()
                    .unwrap_or(Linktype::ETHERNET),
                data: packet.data.to_vec(),
            })
        }
        _ => None,
    }
}
