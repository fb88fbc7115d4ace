//! Description of the data series stored in a history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::history::enums::HistoryEnumOrdinal;

/// Stable identifier of a data series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSeriesId(pub u32);

/// Dense index of a decimal series within a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecimalDataSeriesIndex(pub usize);

/// Dense index of an enum series within a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnumDataSeriesIndex(pub usize);

/// One option of a history enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEnumOption {
    /// Ordinal stored in samples.
    pub ordinal: HistoryEnumOrdinal,
    /// Display label.
    pub label: String,
}

/// Enum type used by an enum series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEnum {
    /// Enum name.
    pub name: String,
    /// Available options.
    pub options: Vec<HistoryEnumOption>,
}

impl HistoryEnum {
    /// Create an enum whose ordinals follow the label order.
    ///
    /// Labels beyond the highest supported ordinal are ignored.
    pub fn from_labels<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = labels
            .into_iter()
            .zip(0..=HistoryEnumOrdinal::MAX)
            .filter_map(|(label, value)| {
                HistoryEnumOrdinal::new(value).map(|ordinal| HistoryEnumOption {
                    ordinal,
                    label: label.into(),
                })
            })
            .collect();
        Self {
            name: name.into(),
            options,
        }
    }

    /// Label for an ordinal.
    pub fn label(&self, ordinal: HistoryEnumOrdinal) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.ordinal == ordinal)
            .map(|option| option.label.as_str())
    }
}

/// Decimal series descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecimalDataSeries {
    /// Stable id.
    pub id: DataSeriesId,
    /// Display name.
    pub name: String,
    /// Unit of the values, if any.
    pub unit: Option<String>,
}

/// Enum series descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDataSeries {
    /// Stable id.
    pub id: DataSeriesId,
    /// Display name.
    pub name: String,
    /// Enum type of the values.
    pub history_enum: HistoryEnum,
}

/// Ordered decimal and enum series of a history.
///
/// Immutable once built. Chunks share it through an [`Arc`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryConfiguration {
    decimal_series: Vec<DecimalDataSeries>,
    enum_series: Vec<EnumDataSeries>,
}

impl HistoryConfiguration {
    /// Start building a configuration.
    pub fn builder() -> HistoryConfigurationBuilder {
        HistoryConfigurationBuilder::default()
    }

    /// A configuration without any series.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of decimal series.
    pub fn decimal_count(&self) -> usize {
        self.decimal_series.len()
    }

    /// Number of enum series.
    pub fn enum_count(&self) -> usize {
        self.enum_series.len()
    }

    /// Access a decimal series.
    pub fn decimal(&self, index: DecimalDataSeriesIndex) -> Option<&DecimalDataSeries> {
        self.decimal_series.get(index.0)
    }

    /// Access an enum series.
    pub fn enumeration(&self, index: EnumDataSeriesIndex) -> Option<&EnumDataSeries> {
        self.enum_series.get(index.0)
    }

    /// All decimal series.
    pub fn decimal_series(&self) -> &[DecimalDataSeries] {
        &self.decimal_series
    }

    /// All enum series.
    pub fn enum_series(&self) -> &[EnumDataSeries] {
        &self.enum_series
    }
}

/// Builder for [`HistoryConfiguration`].
#[derive(Debug, Default)]
pub struct HistoryConfigurationBuilder {
    decimal_series: Vec<DecimalDataSeries>,
    enum_series: Vec<EnumDataSeries>,
}

impl HistoryConfigurationBuilder {
    /// Append a decimal series.
    pub fn decimal(mut self, id: u32, name: impl Into<String>, unit: Option<&str>) -> Self {
        self.decimal_series.push(DecimalDataSeries {
            id: DataSeriesId(id),
            name: name.into(),
            unit: unit.map(str::to_owned),
        });
        self
    }

    /// Append an enum series.
    pub fn enumeration(mut self, id: u32, name: impl Into<String>, history_enum: HistoryEnum) -> Self {
        self.enum_series.push(EnumDataSeries {
            id: DataSeriesId(id),
            name: name.into(),
            history_enum,
        });
        self
    }

    /// Build the shared configuration.
    pub fn build(self) -> Arc<HistoryConfiguration> {
        Arc::new(HistoryConfiguration {
            decimal_series: self.decimal_series,
            enum_series: self.enum_series,
        })
    }
}
