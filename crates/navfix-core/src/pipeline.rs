//! The push-driven pipeline: decode tasks feeding one combine loop.
//!
//! Each input channel gets its own decode task so a noisy stream never
//! stalls decoding of the others. All decoded samples funnel into a single
//! loop that owns the [`Combiner`]; that single ownership serializes latch
//! access, keeps updates in per-stream arrival order, and makes emission
//! synchronous with the position update that triggered it.

use crate::{
    combine::Combiner,
    decode::decode,
    encode::encode,
    types::{NormalizedSample, OutputEnvelope, RawRecord},
};
use eyre::{Result, ensure};
use tracing::{debug, info, trace, warn};

/// Capacity of the decoded-sample queue. Arrivals beyond this backpressure
/// the input channels; the queue discipline is the only bound under load.
const SAMPLE_QUEUE_CAPACITY: usize = 64;

/// Drive raw records from `inputs` through decode, combine and encode,
/// sending every resulting envelope to `envelopes`.
///
/// Runs until every input channel closes, or until the envelope receiver
/// is dropped. Per-record failures are logged and dropped; they never end
/// the pipeline or disturb the latches of the other streams.
pub async fn run(
    inputs: Vec<flume::Receiver<RawRecord>>,
    envelopes: flume::Sender<OutputEnvelope>,
) -> Result<()> {
    ensure!(
        !inputs.is_empty(),
        "pipeline needs at least one input channel"
    );

    let (sample_tx, sample_rx) = flume::bounded(SAMPLE_QUEUE_CAPACITY);
    let decoders: Vec<_> = inputs
        .into_iter()
        .map(|records| tokio::spawn(decode_stream(records, sample_tx.clone())))
        .collect();
    drop(sample_tx);

    let mut combiner = Combiner::new();
    let mut emitted: u64 = 0;
    let mut sink_gone = false;
    while let Ok(sample) = sample_rx.recv_async().await {
        let Some(fix) = combiner.update(sample) else {
            continue;
        };
        emitted += 1;
        if envelopes.send_async(encode(&fix)).await.is_err() {
            debug!("envelope receiver dropped, stopping the pipeline");
            sink_gone = true;
            break;
        }
    }

    // Unblocks any decoder still waiting to hand over a sample. With the
    // sink gone the decoders may block on input channels that never close,
    // so they are cancelled instead of joined.
    drop(sample_rx);
    for decoder in decoders {
        if sink_gone {
            decoder.abort();
        }
        let _ = decoder.await;
    }

    info!(fixes = emitted, "pipeline finished");
    Ok(())
}

/// Decode every record arriving on one input channel.
///
/// A record that fails to decode is logged with its stream tag and cause,
/// then dropped; consumption of the channel continues.
async fn decode_stream(
    records: flume::Receiver<RawRecord>,
    samples: flume::Sender<NormalizedSample>,
) {
    while let Ok(record) = records.recv_async().await {
        match decode(&record) {
            Ok(sample) => {
                trace!(tag = %record.tag, "decoded sample");
                if samples.send_async(sample).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(tag = %err.tag, cause = %err.source, "dropping undecodable record");
            }
        }
    }
}
