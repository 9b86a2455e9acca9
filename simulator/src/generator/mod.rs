pub mod feed;
pub mod trace;

use crate::workflow::config::FeedConfig;
use feed::SyntheticFeed;
use mazecore::frame::FrameSource;
use mazecore::scoring::RegionOfInterest;
use trace::TraceFeed;

/// Opens a fresh frame source for one run. Synthetic feeds are reseeded per
/// run so consecutive teams do not replay the same path.
pub fn open_feed(
    config: &FeedConfig,
    roi: RegionOfInterest,
    run_index: u64,
) -> anyhow::Result<Box<dyn FrameSource>> {
    match config {
        FeedConfig::Synthetic(synthetic) => {
            let mut synthetic = synthetic.clone();
            synthetic.seed = synthetic.seed.wrapping_add(run_index);
            Ok(Box::new(SyntheticFeed::new(synthetic, roi)))
        }
        FeedConfig::Trace { path } => Ok(Box::new(TraceFeed::load(path)?)),
    }
}
