use crate::yearsort_core::organize::CancelToken;
use crate::yearsort_core::photo::AssetRef;
use crate::yearsort_core::resolver::{Resolution, Resolver};
use crate::yearsort_core::storage::StorageBackend;
use crossbeam_channel::unbounded;

/// Resolve capture years for all assets on a pool of `num_workers` threads.
///
/// The result is in discovery order. Slots are `None` for assets that were
/// not resolved because the run was cancelled.
pub fn resolve_years<B: StorageBackend>(
    backend: &B,
    resolver: &Resolver<B>,
    assets: &[AssetRef<B::Locator>],
    num_workers: usize,
    cancel: &CancelToken,
) -> Vec<Option<Resolution>> {
    let (job_tx, job_rx) = unbounded::<usize>();
    let (result_tx, result_rx) = unbounded::<(usize, Resolution)>();

    // Fill the queue before spawning: a worker must never wait on a producer.
    for index in 0..assets.len() {
        if job_tx.send(index).is_err() {
            log::error!("Failed to send job to worker channel");
            break;
        }
    }
    drop(job_tx);

    rayon::scope(|s| {
        for _ in 0..num_workers.max(1) {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();

            s.spawn(move |_| {
                for index in job_rx {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let resolution = resolver.resolve(backend, &assets[index]);
                    if result_tx.send((index, resolution)).is_err() {
                        log::error!("Failed to send result to main thread");
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut years = vec![None; assets.len()];
    for (index, resolution) in result_rx {
        years[index] = Some(resolution);
    }
    years
}
