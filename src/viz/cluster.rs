//! Cluster assignments drawn on the first two principal components

use super::{padded_range, ChartFrame, ChartKind, Palette, Plot, PointGroup, PointsGeometry, RenderedChart, ScatterPoint, Visualizer};
use crate::config::VISUALIZATION_DEFAULTS;
use crate::error::AnalysisError;
use crate::model::ClusteredTable;
use crate::stats;

#[derive(Debug, Clone)]
pub struct ClusterEncoding {
    pub title: String,
    pub palette: Palette,
}

impl ClusterEncoding {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            palette: Palette::Set1,
        }
    }
}

/// Cluster scatter strategy
#[derive(Debug)]
pub struct ClusterPlot<'a> {
    data: &'a ClusteredTable,
    chart: Option<RenderedChart>,
}

impl<'a> ClusterPlot<'a> {
    pub fn new(data: &'a ClusteredTable) -> Self {
        Self { data, chart: None }
    }
}

impl Visualizer for ClusterPlot<'_> {
    type Encoding = ClusterEncoding;

    fn create(&mut self, encoding: ClusterEncoding) -> crate::Result<&RenderedChart> {
        if self.data.is_empty() {
            return Err(AnalysisError::Validation(
                "no clustered rows to plot".to_string(),
            ));
        }

        let colors = encoding.palette.colors(self.data.n_clusters);
        let groups: Vec<PointGroup> = colors
            .into_iter()
            .enumerate()
            .map(|(cluster_id, color)| PointGroup {
                name: Some(format!("Cluster {}", cluster_id)),
                color,
                alpha: VISUALIZATION_DEFAULTS.alpha,
                outlined: false,
                points: self
                    .data
                    .iter()
                    .filter(|a| a.cluster_id == cluster_id)
                    .map(|a| ScatterPoint {
                        x: a.pca1,
                        y: a.pca2,
                        radius: 4.0,
                    })
                    .collect(),
            })
            .filter(|group| !group.points.is_empty())
            .collect();

        let xs: Vec<f64> = self.data.iter().map(|a| a.pca1).collect();
        let ys: Vec<f64> = self.data.iter().map(|a| a.pca2).collect();
        let (x_min, x_max) = stats::min_max(&xs).unwrap_or((0.0, 1.0));
        let (y_min, y_max) = stats::min_max(&ys).unwrap_or((0.0, 1.0));

        let frame = ChartFrame::new(encoding.title, "PCA Component 1", "PCA Component 2");
        let plot = Plot::Points(PointsGeometry {
            groups,
            lines: Vec::new(),
            x_range: padded_range(x_min, x_max, 0.05),
            y_range: padded_range(y_min, y_max, 0.05),
        });
        Ok(&*self.chart.insert(RenderedChart::new(ChartKind::Cluster, frame, plot)))
    }

    fn chart(&self) -> Option<&RenderedChart> {
        self.chart.as_ref()
    }
}
