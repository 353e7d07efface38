// Stacker - cumulative bands in declared channel order
use crate::domain::curve::{DenseCurve, StackedBands};

/// Stacks `curve` channels in `channel_order`, so band `k` is the running
/// sum of channels `0..=k`. Order is taken as given and never sorted by value.
///
/// Panics if a channel in `channel_order` is absent from `curve`.
pub fn stack(curve: &DenseCurve, channel_order: &[String]) -> StackedBands {
    let mut bands: Vec<Vec<f64>> = Vec::with_capacity(channel_order.len());

    for name in channel_order {
        let values = curve
            .channel(name)
            .unwrap_or_else(|| panic!("channel `{}` missing from dense curve", name));

        let band = match bands.last() {
            Some(below) => below.iter().zip(values).map(|(b, v)| b + v).collect(),
            None => values.to_vec(),
        };
        bands.push(band);
    }

    StackedBands {
        timestamps: curve.timestamps.clone(),
        channels: channel_order.to_vec(),
        bands,
    }
}
