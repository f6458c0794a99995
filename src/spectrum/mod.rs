use std::sync::Arc;
use tokio::sync::watch;

/// One analysis window's worth of per-bin intensities.
///
/// Values are normalized bytes (0-255), one per frequency bin, lowest
/// frequency first. The length is fixed when the channel is created and never
/// changes for the lifetime of one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumSnapshot {
    bins: Vec<u8>,
}

impl SpectrumSnapshot {
    pub fn zeroed(len: usize) -> Self {
        Self { bins: vec![0; len] }
    }

    pub fn from_bins(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Intensity of bin `i`; indices past the end read as 0.
    pub fn intensity(&self, i: usize) -> u8 {
        self.bins.get(i).copied().unwrap_or(0)
    }
}

/// Publishing half of a spectrum channel. Lives inside the engine's analysis
/// worker; dropped together with the engine.
pub struct SpectrumPublisher {
    sender: watch::Sender<Arc<SpectrumSnapshot>>,
    bin_count: usize,
}

impl SpectrumPublisher {
    pub fn publish(&self, snapshot: SpectrumSnapshot) {
        debug_assert_eq!(snapshot.len(), self.bin_count);
        // Send errors only mean every source was dropped; nothing to do then.
        let _ = self.sender.send(Arc::new(snapshot));
    }
}

/// Read side of the engine's continuously refreshed magnitude spectrum.
///
/// `snapshot` is non-blocking and always returns the most recent window;
/// before the engine has produced anything it returns the all-zero snapshot
/// the channel was seeded with. Cloning shares the same underlying channel.
#[derive(Clone)]
pub struct SpectrumSource {
    receiver: watch::Receiver<Arc<SpectrumSnapshot>>,
    bin_count: usize,
}

impl SpectrumSource {
    pub fn snapshot(&self) -> Arc<SpectrumSnapshot> {
        self.receiver.borrow().clone()
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }
}

/// Create a spectrum channel with a fixed bin count.
pub fn channel(bin_count: usize) -> (SpectrumPublisher, SpectrumSource) {
    let (sender, receiver) = watch::channel(Arc::new(SpectrumSnapshot::zeroed(bin_count)));
    (
        SpectrumPublisher { sender, bin_count },
        SpectrumSource {
            receiver,
            bin_count,
        },
    )
}
