//! Threshold annotations for value axes.
//!
//! [`ThresholdsSupport`] does not add layers by itself. It creates, per key,
//! a HUD layer showing the threshold values next to the axis of that key and
//! a lines layer drawing them across the content area. Both are created on
//! first use and kept in bounded caches.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::axis::{DomainValues, ValueAxis};
use crate::cache::{BoundedCache, DEFAULT_CACHE_CAPACITY};
use crate::error::LookupError;
use crate::layer::{
    DirectionalLinesLayer, HudConfiguration, HudElementIndex, LabelsProvider, LayerPaintingContext, Layers,
    SharedLayer, ValueAxisHudLayer, VisibleCondition,
};

const TARGET: &str = "meistercharts::threshold";

/// Threshold values per key.
pub trait ThresholdValues<K> {
    /// Number of thresholds of the key.
    fn size(&self, key: &K) -> usize;

    /// Threshold value, `None` if the index does not exist.
    fn value_at(&self, key: &K, index: HudElementIndex) -> Option<f64>;
}

impl<K: Hash + Eq> ThresholdValues<K> for RefCell<FxHashMap<K, Vec<f64>>> {
    fn size(&self, key: &K) -> usize {
        self.borrow().get(key).map_or(0, Vec::len)
    }

    fn value_at(&self, key: &K, index: HudElementIndex) -> Option<f64> {
        self.borrow().get(key)?.get(index.0).copied()
    }
}

/// Threshold labels per key. Lines are separated by `\n`.
pub trait ThresholdLabels<K> {
    /// Label of a threshold, `None` to use the generated fallback.
    fn label_at(&self, key: &K, index: HudElementIndex, context: &LayerPaintingContext<'_>) -> Option<String>;
}

impl<K: Hash + Eq> ThresholdLabels<K> for RefCell<FxHashMap<K, Vec<String>>> {
    fn label_at(&self, key: &K, index: HudElementIndex, _context: &LayerPaintingContext<'_>) -> Option<String> {
        self.borrow().get(key)?.get(index.0).cloned()
    }
}

/// Value axis used for the thresholds of a key.
pub type ValueAxisProvider<K> = Box<dyn Fn(&K) -> Rc<ValueAxis>>;

type HudHook<K> = Box<dyn Fn(&mut HudConfiguration, &K)>;
type LinesHook<K> = Box<dyn Fn(&mut DirectionalLinesLayer, &K)>;
type LabelLinesCache = Rc<RefCell<BoundedCache<String, Rc<[String]>>>>;

/// Layers added by [`ThresholdsSupport::add_layers`].
#[derive(Clone)]
pub struct LayerAddResult<K> {
    /// Key the layers belong to.
    pub key: K,
    /// HUD layer of the key.
    pub hud_layer: Rc<RefCell<ValueAxisHudLayer>>,
    /// Lines layer of the key.
    pub threshold_lines_layer: Rc<RefCell<DirectionalLinesLayer>>,
}

impl<K: fmt::Debug> fmt::Debug for LayerAddResult<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerAddResult").field("key", &self.key).finish_non_exhaustive()
    }
}

/// Lazily created threshold layers, keyed by e.g. data series.
pub struct ThresholdsSupport<K: Hash + Eq> {
    value_axis_provider: ValueAxisProvider<K>,
    values: Rc<dyn ThresholdValues<K>>,
    labels: Rc<dyn ThresholdLabels<K>>,
    label_lines: LabelLinesCache,
    hud_configuration: HudHook<K>,
    lines_configuration: LinesHook<K>,
    hud_layers: BoundedCache<K, Rc<RefCell<ValueAxisHudLayer>>>,
    lines_layers: BoundedCache<K, Rc<RefCell<DirectionalLinesLayer>>>,
}

impl<K> ThresholdsSupport<K>
where
    K: Clone + Hash + Eq + fmt::Debug + 'static,
{
    /// Create the support from its providers.
    pub fn new(
        value_axis_provider: ValueAxisProvider<K>,
        values: Rc<dyn ThresholdValues<K>>,
        labels: Rc<dyn ThresholdLabels<K>>,
    ) -> Self {
        Self {
            value_axis_provider,
            values,
            labels,
            label_lines: Rc::new(RefCell::new(BoundedCache::new("thresholdLabelLines", DEFAULT_CACHE_CAPACITY))),
            hud_configuration: Box::new(|_, _| {}),
            lines_configuration: Box::new(|_, _| {}),
            hud_layers: BoundedCache::new("hudLayersCache", DEFAULT_CACHE_CAPACITY),
            lines_layers: BoundedCache::new("directionalLinesLayersCache", DEFAULT_CACHE_CAPACITY),
        }
    }

    /// Customize HUD layers. Applied to existing layers and to every layer
    /// created later.
    pub fn set_hud_layer_configuration(&mut self, hook: impl Fn(&mut HudConfiguration, &K) + 'static) {
        self.hud_layers.for_each(|key, layer| {
            hook(layer.borrow_mut().configuration_mut(), key);
        });
        self.hud_configuration = Box::new(hook);
    }

    /// Customize lines layers. Applied to existing layers and to every layer
    /// created later.
    pub fn set_threshold_lines_layer_configuration(
        &mut self,
        hook: impl Fn(&mut DirectionalLinesLayer, &K) + 'static,
    ) {
        self.lines_layers.for_each(|key, layer| {
            hook(&mut layer.borrow_mut(), key);
        });
        self.lines_configuration = Box::new(hook);
    }

    /// The HUD layer of a key.
    pub fn get_hud_layer(&mut self, key: &K) -> Rc<RefCell<ValueAxisHudLayer>> {
        let value_axis_provider = &self.value_axis_provider;
        let (values, labels, label_lines) = (&self.values, &self.labels, &self.label_lines);
        let hud_configuration = &self.hud_configuration;
        self.hud_layers.get_or_create(key.clone(), |key| {
            tracing::debug!(target: TARGET, ?key, "creating threshold hud layer");
            let axis = value_axis_provider(key);
            let domain_values = Rc::new(KeyedThresholds {
                key: key.clone(),
                values: Rc::clone(values),
            });
            let mut layer = axis.hud_layer(domain_values);
            let configuration = layer.configuration_mut();
            configuration.labels = Box::new(KeyedLabels {
                key: key.clone(),
                values: Rc::clone(values),
                labels: Rc::clone(labels),
                label_lines: Rc::clone(label_lines),
            });
            hud_configuration(configuration, key);
            Rc::new(RefCell::new(layer))
        })
    }

    /// The lines layer of a key, drawing the thresholds of its HUD layer.
    pub fn get_threshold_lines_layer(&mut self, key: &K) -> Rc<RefCell<DirectionalLinesLayer>> {
        let hud = self.get_hud_layer(key);
        let value_axis_provider = &self.value_axis_provider;
        let lines_configuration = &self.lines_configuration;
        self.lines_layers.get_or_create(key.clone(), |key| {
            tracing::debug!(target: TARGET, ?key, "creating threshold lines layer");
            let axis = value_axis_provider(key);
            let mut layer = DirectionalLinesLayer::create_for_value_axis_and_hud(&axis, hud);
            lines_configuration(&mut layer, key);
            Rc::new(RefCell::new(layer))
        })
    }

    /// Add the HUD layer and the lines layer of a key, in that order.
    pub fn add_layers(&mut self, layers: &mut Layers, key: K, visible: Option<VisibleCondition>) -> LayerAddResult<K> {
        let hud_layer = self.get_hud_layer(&key);
        let threshold_lines_layer = self.get_threshold_lines_layer(&key);

        let entries: [SharedLayer; 2] = [hud_layer.clone(), threshold_lines_layer.clone()];
        for layer in entries {
            match &visible {
                Some(condition) => layers.add_layer_visible_if(layer, Rc::clone(condition)),
                None => layers.add_layer(layer),
            }
        }

        LayerAddResult {
            key,
            hud_layer,
            threshold_lines_layer,
        }
    }
}

impl<K: Hash + Eq> fmt::Debug for ThresholdsSupport<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThresholdsSupport")
            .field("hud_layers", &self.hud_layers.len())
            .field("lines_layers", &self.lines_layers.len())
            .finish()
    }
}

fn missing_threshold<K: fmt::Debug>(key: &K, index: HudElementIndex) -> LookupError {
    LookupError::MissingThreshold {
        series: format!("{key:?}"),
        index: index.0,
    }
}

struct KeyedThresholds<K> {
    key: K,
    values: Rc<dyn ThresholdValues<K>>,
}

impl<K: fmt::Debug> DomainValues for KeyedThresholds<K> {
    fn size(&self) -> usize {
        self.values.size(&self.key)
    }

    fn value_at(&self, index: HudElementIndex) -> Result<f64, LookupError> {
        self.values
            .value_at(&self.key, index)
            .ok_or_else(|| missing_threshold(&self.key, index))
    }
}

struct KeyedLabels<K> {
    key: K,
    values: Rc<dyn ThresholdValues<K>>,
    labels: Rc<dyn ThresholdLabels<K>>,
    label_lines: LabelLinesCache,
}

impl<K: fmt::Debug> LabelsProvider for KeyedLabels<K> {
    fn labels_at(
        &self,
        index: HudElementIndex,
        context: &LayerPaintingContext<'_>,
    ) -> Result<Rc<[String]>, LookupError> {
        if index.0 >= self.values.size(&self.key) {
            return Err(missing_threshold(&self.key, index));
        }
        let label = self
            .labels
            .label_at(&self.key, index, context)
            .unwrap_or_else(|| format!("Threshold {:?} / {}", self.key, index));
        Ok(self
            .label_lines
            .borrow_mut()
            .get_or_create(label, |label| label.split('\n').map(String::from).collect::<Vec<_>>().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{Side, ValueRange};
    use crate::layer::tests::Fixture;
    use crate::layer::{Layer, PaintingVariables};
    use crate::render::{LineStyle, RenderCommand};

    struct Setup {
        values: Rc<RefCell<FxHashMap<u32, Vec<f64>>>>,
        support: ThresholdsSupport<u32>,
    }

    fn setup() -> Setup {
        let values: Rc<RefCell<FxHashMap<u32, Vec<f64>>>> = Rc::default();
        values.borrow_mut().insert(7, vec![25.0, 50.0]);
        let labels: Rc<RefCell<FxHashMap<u32, Vec<String>>>> = Rc::default();
        labels.borrow_mut().insert(7, vec!["Upper\nlimit".to_string()]);

        let axis = Rc::new(ValueAxis::new(Side::Left, ValueRange::linear(0.0, 100.0)));
        let support = ThresholdsSupport::new(Box::new(move |_: &u32| Rc::clone(&axis)), values.clone(), labels);
        Setup { values, support }
    }

    #[test]
    fn layers_are_created_once_per_key() {
        let mut setup = setup();
        let first = setup.support.get_hud_layer(&7);
        let second = setup.support.get_hud_layer(&7);
        assert!(Rc::ptr_eq(&first, &second));
        assert!(!Rc::ptr_eq(&first, &setup.support.get_hud_layer(&8)));

        let lines = setup.support.get_threshold_lines_layer(&7);
        assert!(Rc::ptr_eq(&lines, &setup.support.get_threshold_lines_layer(&7)));
    }

    #[test]
    fn labels_are_split_and_fall_back() {
        let mut setup = setup();
        let hud = setup.support.get_hud_layer(&7);
        let fixture = Fixture::new();
        hud.borrow_mut().calculate(&fixture.context(1)).unwrap();

        let hud = hud.borrow();
        let labels = &hud.painting_variables().labels;
        assert_eq!(&**labels.get(HudElementIndex(0)), ["Upper", "limit"]);
        assert_eq!(&**labels.get(HudElementIndex(1)), ["Threshold 7 / 1"]);
    }

    #[test]
    fn missing_threshold_is_reported() {
        let setup = setup();
        let thresholds = KeyedThresholds {
            key: 7_u32,
            values: setup.values,
        };
        assert_eq!(
            thresholds.value_at(HudElementIndex(2)),
            Err(LookupError::MissingThreshold {
                series: "7".to_string(),
                index: 2
            })
        );
    }

    #[test]
    fn added_layers_paint_huds_and_lines() {
        let mut setup = setup();
        let fixture = Fixture::new();
        let mut layers = Layers::new();
        let result = setup.support.add_layers(&mut layers, 7, None);
        assert_eq!(result.key, 7);
        assert_eq!(layers.len(), 2);

        let mut context = fixture.context(1);
        layers.paint(&mut context).unwrap();
        let boxes = context
            .render
            .commands()
            .iter()
            .filter(|command| matches!(command, RenderCommand::TextBox { .. }))
            .count();
        let lines = context
            .render
            .commands()
            .iter()
            .filter(|command| matches!(command, RenderCommand::Line { .. }))
            .count();
        assert_eq!((boxes, lines), (2, 2));
        assert_eq!(result.threshold_lines_layer.borrow().calculated_frame(), Some(1));
    }

    #[test]
    fn configuration_hooks_reach_existing_and_new_layers() {
        let mut setup = setup();
        let existing = setup.support.get_hud_layer(&7);
        setup
            .support
            .set_hud_layer_configuration(|configuration, _| configuration.arrow_head_length = 3.0);
        let created = setup.support.get_hud_layer(&8);
        assert_eq!(existing.borrow().configuration().arrow_head_length, 3.0);
        assert_eq!(created.borrow().configuration().arrow_head_length, 3.0);

        let style = LineStyle {
            width: 4.0,
            ..LineStyle::default()
        };
        let existing = setup.support.get_threshold_lines_layer(&7);
        setup
            .support
            .set_threshold_lines_layer_configuration(move |layer, _| layer.set_line_style(Some(style)));
        let created = setup.support.get_threshold_lines_layer(&8);
        assert_eq!(existing.borrow().line_style(), Some(&style));
        assert_eq!(created.borrow().line_style(), Some(&style));
    }
}
