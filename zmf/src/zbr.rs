//! The Zoner Zebra (ZBR) parser.
//!
//! Only the header is understood; the record stream behind it is not
//! decoded, so a supported file produces an empty document.

use crate::collector::Collector;
use crate::sink::DrawingSink;
use zmf_syntax::reader::Reader;
use zmf_syntax::zbr::ZbrHeader;
use zmf_syntax::Result;

pub(crate) struct ZbrParser<'a> {
    reader: Reader<'a>,
}

impl<'a> ZbrParser<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
        }
    }

    pub(crate) fn parse(&mut self, sink: &mut dyn DrawingSink) -> Result<()> {
        ZbrHeader::read(&mut self.reader)?;

        let mut collector = Collector::new(sink);
        collector.start_document();
        collector.end_document();

        Ok(())
    }
}
