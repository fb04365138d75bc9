//! Metric registration and submetric resolution.
//!
//! Metrics are declared and configured on a [`RegistryBuilder`], which owns
//! them mutably. [`RegistryBuilder::build`] links every requested submetric
//! to a freshly materialized metric and freezes the result behind `Arc`s, so
//! the [`Registry`] can be shared by any number of sample producers.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StatsConfig;
use crate::error::StatsError;
use crate::metrics::Metric;
use crate::submetric::Submetric;
use crate::types::{MetricType, ValueType};
use crate::{Sample, Summary};

pub struct RegistryBuilder {
    config: StatsConfig,
    metrics: BTreeMap<String, Metric>,
    submetrics: Vec<String>,
}

impl RegistryBuilder {
    pub fn new(config: StatsConfig) -> Self {
        Self {
            config,
            metrics: BTreeMap::new(),
            submetrics: Vec::new(),
        }
    }

    /// Gets or declares a metric. Re-declaring with another type fails.
    pub fn metric(
        &mut self,
        name: &str,
        typ: MetricType,
        contains: Option<ValueType>,
    ) -> Result<&mut Metric, StatsError> {
        match self.metrics.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                if existing.typ != typ {
                    tracing::warn!(metric = name, existing = %existing.typ, requested = %typ, "metric type conflict");
                    return Err(StatsError::MetricConflict {
                        name: name.to_string(),
                        existing: existing.typ,
                        requested: typ,
                    });
                }
                Ok(existing)
            }
            Entry::Vacant(entry) => {
                tracing::debug!(metric = name, metric_type = %typ, "registering metric");
                Ok(entry.insert(Metric::with_config(name, typ, contains, &self.config)))
            }
        }
    }

    /// Queues a filter-bearing name, resolved by [`RegistryBuilder::build`].
    pub fn submetric(&mut self, name: impl Into<String>) -> &mut Self {
        self.submetrics.push(name.into());
        self
    }

    /// Validates the configuration and resolves queued submetrics.
    pub fn build(mut self) -> Result<Registry, StatsError> {
        self.config.validate()?;
        let names = std::mem::take(&mut self.submetrics);
        for name in names {
            let (parent_name, mut sm) = Submetric::parse(&name);
            let parent = self
                .metrics
                .get_mut(&parent_name)
                .ok_or_else(|| StatsError::UnknownMetric(parent_name.clone()))?;
            if parent.submetrics.iter().any(|s| s.name == sm.name) {
                continue;
            }

            let mut child = Metric::with_config(&sm.name, parent.typ, Some(parent.contains), &self.config);
            child.sub = Some(sm.clone());
            sm.metric = Some(Arc::new(child));

            tracing::debug!(submetric = %sm.name, parent = %parent_name, "resolved submetric");
            parent.submetrics.push(Arc::new(sm));
        }

        let metrics = self
            .metrics
            .into_iter()
            .map(|(name, metric)| (name, Arc::new(metric)))
            .collect();
        Ok(Registry { metrics })
    }
}

/// Resolved, shareable set of metrics.
#[derive(Debug, Default)]
pub struct Registry {
    metrics: BTreeMap<String, Arc<Metric>>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&Arc<Metric>> {
        self.metrics.get(name)
    }

    /// Top level metrics in name order
    pub fn metrics(&self) -> impl Iterator<Item = &Arc<Metric>> {
        self.metrics.values()
    }

    /// Routes a sample into its metric and matching submetrics.
    pub fn add_sample(&self, sample: &Sample) {
        sample.metric.add(sample);
    }

    pub fn add_samples(&self, samples: &[Sample]) {
        samples.iter().for_each(|s| self.add_sample(s));
    }

    /// One summary per metric and per submetric, in name order.
    pub fn summaries(&self, window: Duration) -> Vec<Summary> {
        let mut out: Vec<Summary> = self
            .metrics
            .values()
            .flat_map(|m| {
                let subs = m
                    .submetrics
                    .iter()
                    .filter_map(|sm| sm.metric.as_ref())
                    .map(move |sub| sub.summary(window));
                std::iter::once(m.summary(window)).chain(subs)
            })
            .collect();
        out.sort_by(|a, b| a.metric.name.cmp(&b.metric.name));
        out
    }
}
