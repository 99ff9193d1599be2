/// Owner of the two Sparkplug counters of a node session.
///
/// `seq` numbers every message published while connected and wraps from 255 to 0. `bdSeq`
/// identifies a connection: birth and death certificates of the same connection carry the
/// same value.
#[derive(Debug, Default)]
pub(crate) struct SequenceAuthority {
    seq: u8,
    bdseq: u8,
    upcoming_bdseq: u8,
}

impl SequenceAuthority {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take the current `seq` and advance it.
    pub(crate) fn next_seq(&mut self) -> u8 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    /// Hand back a `seq` whose message was never published.
    ///
    /// Only the most recently taken value can be returned, anything else is ignored.
    pub(crate) fn release_seq(&mut self, seq: u8) {
        if self.seq == seq.wrapping_add(1) {
            self.seq = seq;
        }
    }

    pub(crate) fn reset_seq(&mut self) {
        self.seq = 0;
    }

    pub(crate) fn current_bdseq(&self) -> u8 {
        self.bdseq
    }

    /// The `bdSeq` the next call to [Self::advance_bdseq] makes current.
    pub(crate) fn upcoming_bdseq(&self) -> u8 {
        self.upcoming_bdseq
    }

    pub(crate) fn advance_bdseq(&mut self) -> u8 {
        self.bdseq = self.upcoming_bdseq;
        self.upcoming_bdseq = self.upcoming_bdseq.wrapping_add(1);
        self.bdseq
    }
}
