use crate::{Attrs, TopologyError};

/// Immutable record of an edge's shaping parameters.
///
/// Ids are assigned monotonically by the builder and are unique within a
/// topology.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpec {
    id: String,
    bandwidth_mbps: f64,
    delay_ms: f64,
    loss_pct: f64,
}

impl LinkSpec {
    pub fn new(
        id: impl Into<String>,
        bandwidth_mbps: f64,
        delay_ms: f64,
        loss_pct: f64,
    ) -> Result<Self, TopologyError> {
        let id = id.into();
        for (name, value) in [
            ("bandwidth", bandwidth_mbps),
            ("delay", delay_ms),
            ("loss", loss_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TopologyError::InvalidLinkParams {
                    link: id,
                    reason: format!("{name} must be a non-negative number, got {value}"),
                });
            }
        }
        if loss_pct > 100.0 {
            return Err(TopologyError::InvalidLinkParams {
                link: id,
                reason: format!("loss must be a percentage between 0 and 100, got {loss_pct}"),
            });
        }

        Ok(Self {
            id,
            bandwidth_mbps,
            delay_ms,
            loss_pct,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The attribute mapping attached to this link's graph edge.
    pub fn attributes(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("id".to_string(), self.id.clone());
        attrs.insert("bandwidth".to_string(), self.bandwidth_mbps.to_string());
        attrs.insert("delay".to_string(), self.delay_ms.to_string());
        attrs.insert("loss".to_string(), self.loss_pct.to_string());
        attrs
    }
}
