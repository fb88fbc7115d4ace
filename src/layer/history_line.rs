//! Line of one decimal series read from the history.

use std::rc::Rc;

use crate::axis::ValueAxis;
use crate::error::LayerError;
use crate::geom::Coordinates;
use crate::history::{DecimalDataSeriesIndex, GapCalculator, SamplingPeriod};
use crate::layer::{Layer, LayerPaintingContext, PaintingVariables};
use crate::render::{RenderCommand, build_clipped_polylines};

/// Paints a decimal series over the visible time range.
///
/// With downsampling enabled the sampling period is the coarsest one that
/// still provides about one sample per pixel, but never finer than the
/// natural period. Otherwise the natural period is used. Gaps larger
/// than the gap calculator allows break the line.
pub struct HistoryLineLayer {
    series: DecimalDataSeriesIndex,
    value_axis: Rc<ValueAxis>,
    gap_calculator: GapCalculator,
    calculated_frame: Option<u64>,
    sampling_period: Option<SamplingPeriod>,
    polylines: Vec<Vec<Coordinates>>,
}

impl HistoryLineLayer {
    /// Create a layer painting `series` against `value_axis`.
    pub fn new(series: DecimalDataSeriesIndex, value_axis: Rc<ValueAxis>) -> Self {
        Self {
            series,
            value_axis,
            gap_calculator: GapCalculator::default(),
            calculated_frame: None,
            sampling_period: None,
            polylines: Vec::new(),
        }
    }

    /// Replace the gap calculator.
    pub fn set_gap_calculator(&mut self, gap_calculator: GapCalculator) {
        self.gap_calculator = gap_calculator;
    }

    /// The painted series.
    pub fn series(&self) -> DecimalDataSeriesIndex {
        self.series
    }

    /// Period queried by the last calculation.
    pub fn sampling_period(&self) -> Option<SamplingPeriod> {
        self.sampling_period
    }

    /// Polylines of the last calculation, in window coordinates.
    pub fn polylines(&self) -> &[Vec<Coordinates>] {
        &self.polylines
    }
}

impl PaintingVariables for HistoryLineLayer {
    fn calculated_frame(&self) -> Option<u64> {
        self.calculated_frame
    }
}

impl Layer for HistoryLineLayer {
    fn calculate(&mut self, context: &LayerPaintingContext<'_>) -> Result<(), LayerError> {
        let chart = context.chart;
        let natural = context.history.natural_sampling_period();
        let sampling_period = if context.history.is_down_sampling_enabled() {
            natural.max(SamplingPeriod::with_max_distance(chart.millis_per_pixel()))
        } else {
            natural
        };
        let result = context.history.query(chart.visible_time_range, sampling_period);

        let timestamps = result.timestamps();
        let values = result.decimal_values(self.series);
        let area = chart.content_area;

        let mut points = Vec::with_capacity(timestamps.len());
        for segment in self.gap_calculator.segments(sampling_period, &timestamps) {
            if !points.is_empty() {
                points.push(Coordinates::new(f64::NAN, f64::NAN));
            }
            points.extend(segment.map(|row| {
                Coordinates::new(
                    chart.time_to_window_x(timestamps[row]),
                    values
                        .get(row)
                        .map_or(f64::NAN, |value| self.value_axis.domain_to_window(*value, area)),
                )
            }));
        }
        build_clipped_polylines(&points, area, &mut self.polylines);

        self.sampling_period = Some(sampling_period);
        self.calculated_frame = Some(context.frame);
        Ok(())
    }

    fn paint(&mut self, context: &mut LayerPaintingContext<'_>) -> Result<(), LayerError> {
        self.ensure_calculated(context.frame)?;
        let style = context.theme.history_line;
        for points in &self.polylines {
            context.render.push(RenderCommand::Polyline {
                points: points.clone(),
                style,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{PaintRange, Side, ValueRange};
    use crate::history::{HistoryChunk, HistoryConfiguration};
    use crate::layer::tests::Fixture;

    fn store(fixture: &mut Fixture, rows: &[(f64, f64)]) {
        let configuration = HistoryConfiguration::builder().decimal(1, "Value", None).build();
        let mut builder = HistoryChunk::builder(configuration);
        for (timestamp, value) in rows {
            builder.add(*timestamp, &[*value], &[]).unwrap();
        }
        let chunk = builder.build().unwrap();
        fixture
            .history
            .store(&chunk, SamplingPeriod::EveryHundredMillis)
            .unwrap();
    }

    fn layer() -> HistoryLineLayer {
        let axis = ValueAxis::new(Side::Left, ValueRange::linear(0.0, 100.0)).with_paint_range(PaintRange::Continuous);
        HistoryLineLayer::new(DecimalDataSeriesIndex(0), Rc::new(axis))
    }

    #[test]
    fn gaps_split_the_line() {
        let mut fixture = Fixture::new();
        store(
            &mut fixture,
            &[(0.0, 50.0), (100.0, 50.0), (200.0, 100.0), (1_000.0, 0.0), (1_100.0, 0.0)],
        );
        let mut layer = layer();
        let mut context = fixture.context(1);
        layer.calculate(&context).unwrap();
        layer.paint(&mut context).unwrap();

        assert_eq!(layer.sampling_period(), Some(SamplingPeriod::EveryHundredMillis));
        assert_eq!(
            layer.polylines(),
            &[
                vec![
                    Coordinates::new(50.0, 100.0),
                    Coordinates::new(60.0, 100.0),
                    Coordinates::new(70.0, 0.0),
                ],
                vec![Coordinates::new(150.0, 200.0), Coordinates::new(160.0, 200.0)],
            ]
        );
        assert_eq!(context.render.len(), 2);
    }

    #[test]
    fn coarse_zoom_queries_coarse_period() {
        let mut fixture = Fixture::new();
        fixture.history.schedule_down_sampling();
        fixture.chart.visible_time_range = crate::time::TimeRange::new(0.0, 4_000_000.0);
        let mut layer = layer();
        layer.calculate(&fixture.context(1)).unwrap();
        assert_eq!(layer.sampling_period(), Some(SamplingPeriod::EveryTenSeconds));
        assert!(layer.polylines().is_empty());
    }

    #[test]
    fn coarse_zoom_without_down_sampling_keeps_natural_period() {
        let mut fixture = Fixture::new();
        let rows: Vec<(f64, f64)> = (0..200).map(|i| (i as f64 * 100.0, 50.0)).collect();
        store(&mut fixture, &rows);
        fixture.chart.visible_time_range = crate::time::TimeRange::new(0.0, 4_000_000.0);
        let mut layer = layer();
        layer.calculate(&fixture.context(1)).unwrap();
        assert_eq!(layer.sampling_period(), Some(SamplingPeriod::EveryHundredMillis));
        assert_eq!(layer.polylines().len(), 1);
        assert_eq!(layer.polylines()[0].len(), 200);
    }

    #[test]
    fn paint_requires_calculation() {
        let fixture = Fixture::new();
        let mut layer = layer();
        assert_eq!(
            layer.paint(&mut fixture.context(3)),
            Err(LayerError::NotCalculated { frame: 3 })
        );
    }
}
