//! Schema-driven materialization of logical rows.
//!
//! The field type drives the walk and the row supplies raw values. A type is
//! read either from a title (a named column span, possibly with sub-titles)
//! or from a [`CellStream`] of separator-split values:
//!
//! * primitive: one value, converted per the primitive's rules
//! * bean: fields by sub-title name, or consecutive stream values
//! * collection: every stream value, or one element per physical row for
//!   multi-row titles

use cfgsheet_common::{CellLocation, CellValue, DataCreateError, DataCreateErrorKind};
use cfgsheet_schema::{
    CollectionKind, PrimitiveType, Schema, SchemaError, TBean, TCollection, TType, TypeKind,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rustc_hash::FxHashSet;

use crate::config::LoaderConfig;
use crate::data::{DBean, DataValue};
use crate::raw::RawRow;
use crate::sheet::LogicalRow;
use crate::stream::{CellStream, StreamItem};
use crate::tags::is_ignore_tag;
use crate::title::Title;

/// Failure while materializing one row.
#[derive(Debug)]
pub enum CreateError {
    /// A cell could not be turned into the declared type.
    Data(DataCreateError),
    /// The schema itself could not be resolved, e.g. an unknown bean.
    Schema(SchemaError),
}

impl CreateError {
    fn push_field(self, name: &str) -> Self {
        match self {
            CreateError::Data(e) => CreateError::Data(e.push_field(name)),
            other => other,
        }
    }

    fn push_index(self, index: usize) -> Self {
        match self {
            CreateError::Data(e) => CreateError::Data(e.push_index(index)),
            other => other,
        }
    }
}

impl From<DataCreateError> for CreateError {
    fn from(e: DataCreateError) -> Self {
        CreateError::Data(e)
    }
}

impl From<SchemaError> for CreateError {
    fn from(e: SchemaError) -> Self {
        CreateError::Schema(e)
    }
}

impl std::fmt::Display for CreateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateError::Data(e) => write!(f, "{e}"),
            CreateError::Schema(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CreateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CreateError::Data(e) => Some(e),
            CreateError::Schema(e) => Some(e),
        }
    }
}

type CreateResult<T> = Result<T, CreateError>;

fn data_err(kind: DataCreateErrorKind, location: CellLocation) -> CreateError {
    CreateError::Data(DataCreateError::new(kind).with_location(location))
}

fn invalid(expected: &str, value: &CellValue, location: CellLocation) -> CreateError {
    data_err(
        DataCreateErrorKind::InvalidValue {
            expected: expected.to_string(),
            found: value.kind_name(),
            value: value.to_text(),
        },
        location,
    )
}

fn out_of_range(expected: &str, value: &CellValue, location: CellLocation) -> CreateError {
    data_err(
        DataCreateErrorKind::OutOfRange {
            expected: expected.to_string(),
            value: value.to_text(),
        },
        location,
    )
}

fn expect_end(stream: &CellStream) -> CreateResult<()> {
    match stream.peek() {
        Some(item) => Err(data_err(
            DataCreateErrorKind::ExtraData {
                value: item.value.to_text(),
            },
            item.location,
        )),
        None => Ok(()),
    }
}

/// Stateless resolver from (type, row) to a typed value. The same inputs
/// always produce the same output.
#[derive(Debug, Clone, Copy)]
pub struct SheetDataCreator<'s> {
    schema: &'s Schema,
    config: &'s LoaderConfig,
}

impl<'s> SheetDataCreator<'s> {
    pub fn new(schema: &'s Schema, config: &'s LoaderConfig) -> Self {
        Self { schema, config }
    }

    /// Materialize a whole record: `bean` laid over the row's root title.
    pub fn create_bean(&self, bean: &TBean, row: &LogicalRow<'_>) -> CreateResult<DBean> {
        self.bean_from_title(bean, row.root_title(), row)
    }

    /// Materialize `ty` from the columns of `title`.
    pub fn create(&self, ty: &TType, title: &Title, row: &LogicalRow<'_>) -> CreateResult<DataValue> {
        self.from_title(ty, title, row, None)
    }

    /* ───────────────────────── title level ───────────────────────── */

    fn from_title(
        &self,
        ty: &TType,
        title: &Title,
        row: &LogicalRow<'_>,
        field_sep: Option<&str>,
    ) -> CreateResult<DataValue> {
        match &ty.kind {
            TypeKind::Primitive(p) => self.primitive_from_title(*p, ty.nullable, title, row, field_sep),
            TypeKind::Bean(name) => {
                let bean = self.schema.bean(name)?;
                let first = row.first();
                if title.has_sub_titles() {
                    if ty.nullable && first.is_blank_in(title.from_index, title.to_index) {
                        return Ok(DataValue::Null);
                    }
                    return Ok(DataValue::Bean(self.bean_from_title(bean, title, row)?));
                }
                let sep = title.sep().or(field_sep).or(bean.sep.as_deref());
                let mut stream = CellStream::from_row(first, title.from_index, title.to_index, sep);
                if ty.nullable && (stream.is_empty() || self.take_null(&mut stream)) {
                    expect_end(&stream)?;
                    return Ok(DataValue::Null);
                }
                let value = self.bean_from_stream(bean, &mut stream)?;
                expect_end(&stream)?;
                Ok(DataValue::Bean(value))
            }
            TypeKind::Collection(coll) => self.collection_from_title(ty, coll, title, row, field_sep),
        }
    }

    fn bean_from_title(&self, bean: &TBean, title: &Title, row: &LogicalRow<'_>) -> CreateResult<DBean> {
        let mut out = DBean::new(bean.name.as_str());
        for field in &bean.fields {
            let value = match title.sub_title(&field.name) {
                Some(sub) => self.from_title(&field.ty, sub, row, field.sep.as_deref()),
                None if field.ty.nullable => Ok(DataValue::Null),
                None => Err(data_err(
                    DataCreateErrorKind::MissingColumn {
                        bean: bean.name.clone(),
                        field: field.name.clone(),
                    },
                    title.location(row.row_number()),
                )),
            }
            .map_err(|e| e.push_field(&field.name))?;
            out.fields.push((field.name.clone(), value));
        }
        Ok(out)
    }

    fn primitive_from_title(
        &self,
        p: PrimitiveType,
        nullable: bool,
        title: &Title,
        row: &LogicalRow<'_>,
        field_sep: Option<&str>,
    ) -> CreateResult<DataValue> {
        let sep = title.sep().or(field_sep);
        let mut stream = CellStream::from_row(row.first(), title.from_index, title.to_index, sep);
        let Some(item) = stream.next() else {
            return self.empty_value(p, nullable, title, title.location(row.row_number()));
        };
        expect_end(&stream)?;
        self.convert(p, nullable, &item)
    }

    /// Value for an empty primitive column.
    fn empty_value(
        &self,
        p: PrimitiveType,
        nullable: bool,
        title: &Title,
        location: CellLocation,
    ) -> CreateResult<DataValue> {
        if nullable {
            return Ok(DataValue::Null);
        }
        if title.non_empty() {
            return Err(data_err(DataCreateErrorKind::EmptyValue, location));
        }
        if let Some(default) = title.default_value() {
            let item = StreamItem {
                value: CellValue::from(default),
                location,
            };
            if !item.value.is_blank() {
                return self.convert(p, false, &item);
            }
        }
        if self.config.empty_as_default {
            Ok(zero_value(p))
        } else {
            Err(data_err(DataCreateErrorKind::EmptyValue, location))
        }
    }

    fn collection_from_title(
        &self,
        ty: &TType,
        coll: &TCollection,
        title: &Title,
        row: &LogicalRow<'_>,
        field_sep: Option<&str>,
    ) -> CreateResult<DataValue> {
        let sep = title
            .sep()
            .or(field_sep)
            .or(coll.sep.as_deref())
            .unwrap_or(self.config.default_collection_sep.as_str());

        let mut entries = Vec::new();
        if title.multi_row {
            for (i, phys) in row.rows().iter().enumerate() {
                if phys.is_blank_in(title.from_index, title.to_index) {
                    continue;
                }
                // An ignored continuation row drops out on its own.
                if i > 0 && is_ignore_tag(&phys.marker(), self.config) {
                    continue;
                }
                let index = entries.len();
                let entry = self
                    .element_from_row(coll, title, row, phys, sep)
                    .map_err(|e| e.push_index(index))?;
                entries.push(entry);
            }
        } else {
            let mut stream =
                CellStream::from_row(row.first(), title.from_index, title.to_index, Some(sep));
            if ty.nullable && self.take_null(&mut stream) {
                expect_end(&stream)?;
                return Ok(DataValue::Null);
            }
            entries = self.entries_from_stream(coll, &mut stream)?;
        }

        if entries.is_empty() {
            if ty.nullable {
                return Ok(DataValue::Null);
            }
            if title.non_empty() {
                return Err(data_err(
                    DataCreateErrorKind::EmptyValue,
                    title.location(row.row_number()),
                ));
            }
        }
        finish_collection(&coll.kind, entries)
    }

    /// One element (or map entry) of a multi-row collection, from one
    /// physical row.
    fn element_from_row(
        &self,
        coll: &TCollection,
        title: &Title,
        row: &LogicalRow<'_>,
        phys: &RawRow,
        sep: &str,
    ) -> CreateResult<Entry> {
        let single = LogicalRow::single(row.title_row(), phys);
        let location = CellLocation::new(phys.row, title.from_index);

        if let (TypeKind::Bean(name), CollectionKind::List | CollectionKind::Array) =
            (&coll.element.kind, &coll.kind)
        {
            if title.has_sub_titles() {
                let bean = self.schema.bean(name)?;
                let value = DataValue::Bean(self.bean_from_title(bean, title, &single)?);
                return Ok(Entry::Value(value, location));
            }
        }

        let mut stream = CellStream::from_row(phys, title.from_index, title.to_index, Some(sep));
        let entry = match &coll.kind {
            CollectionKind::Map { key } => {
                let k = self.read(key, None, &mut stream)?;
                let v = self.read(&coll.element, None, &mut stream)?;
                Entry::Pair(k, v, location)
            }
            _ => Entry::Value(self.read(&coll.element, None, &mut stream)?, location),
        };
        expect_end(&stream)?;
        Ok(entry)
    }

    /* ───────────────────────── stream level ──────────────────────── */

    /// Consume the null literal if it is next.
    fn take_null(&self, stream: &mut CellStream) -> bool {
        let is_null = stream
            .peek()
            .and_then(|item| item.value.as_text())
            .is_some_and(|t| self.config.is_null_literal(t));
        if is_null {
            stream.next();
        }
        is_null
    }

    fn bean_from_stream(&self, bean: &TBean, stream: &mut CellStream) -> CreateResult<DBean> {
        let mut out = DBean::new(bean.name.as_str());
        for field in &bean.fields {
            let value = self
                .read(&field.ty, field.sep.as_deref(), stream)
                .map_err(|e| e.push_field(&field.name))?;
            out.fields.push((field.name.clone(), value));
        }
        Ok(out)
    }

    fn entries_from_stream(&self, coll: &TCollection, stream: &mut CellStream) -> CreateResult<Vec<Entry>> {
        let mut entries = Vec::new();
        while !stream.is_exhausted() {
            let before = stream.remaining();
            let index = entries.len();
            let location = stream.location();
            let entry = match &coll.kind {
                CollectionKind::Map { key } => {
                    let k = self.read(key, None, stream);
                    let k = k.map_err(|e| e.push_index(index))?;
                    let v = self
                        .read(&coll.element, None, stream)
                        .map_err(|e| e.push_index(index))?;
                    Entry::Pair(k, v, location)
                }
                _ => Entry::Value(
                    self.read(&coll.element, None, stream)
                        .map_err(|e| e.push_index(index))?,
                    location,
                ),
            };
            entries.push(entry);
            if stream.remaining() == before {
                break;
            }
        }
        Ok(entries)
    }

    /// Read one value of `ty` from the stream. A bean or collection with its
    /// own separator (`own_sep`, else the type's) takes a single item and
    /// splits it; otherwise it keeps consuming the shared stream.
    fn read(&self, ty: &TType, own_sep: Option<&str>, stream: &mut CellStream) -> CreateResult<DataValue> {
        match &ty.kind {
            TypeKind::Primitive(p) => match stream.next() {
                Some(item) => self.convert(*p, ty.nullable, &item),
                None if ty.nullable => Ok(DataValue::Null),
                None => Err(data_err(
                    DataCreateErrorKind::MissingData {
                        expected: p.name().to_string(),
                    },
                    stream.location(),
                )),
            },
            TypeKind::Bean(name) => {
                let bean = self.schema.bean(name)?;
                if ty.nullable && (stream.is_exhausted() || self.take_null(stream)) {
                    return Ok(DataValue::Null);
                }
                match own_sep.or(bean.sep.as_deref()) {
                    Some(sep) => {
                        let Some(item) = stream.next() else {
                            return Err(data_err(
                                DataCreateErrorKind::MissingData {
                                    expected: bean.name.clone(),
                                },
                                stream.location(),
                            ));
                        };
                        let mut sub = CellStream::from_item(&item, Some(sep));
                        let value = self.bean_from_stream(bean, &mut sub)?;
                        expect_end(&sub)?;
                        Ok(DataValue::Bean(value))
                    }
                    None => Ok(DataValue::Bean(self.bean_from_stream(bean, stream)?)),
                }
            }
            TypeKind::Collection(coll) => {
                if ty.nullable && (stream.is_exhausted() || self.take_null(stream)) {
                    return Ok(DataValue::Null);
                }
                let entries = match own_sep.or(coll.sep.as_deref()) {
                    Some(sep) => match stream.next() {
                        Some(item) => {
                            let mut sub = CellStream::from_item(&item, Some(sep));
                            self.entries_from_stream(coll, &mut sub)?
                        }
                        None => Vec::new(),
                    },
                    None => self.entries_from_stream(coll, stream)?,
                };
                finish_collection(&coll.kind, entries)
            }
        }
    }

    /* ──────────────────────── primitive rules ────────────────────── */

    fn convert(&self, p: PrimitiveType, nullable: bool, item: &StreamItem) -> CreateResult<DataValue> {
        let value = &item.value;
        let loc = item.location;
        if nullable
            && value
                .as_text()
                .is_some_and(|t| self.config.is_null_literal(t))
        {
            return Ok(DataValue::Null);
        }

        match p {
            PrimitiveType::Bool => {
                let b = match value {
                    CellValue::Boolean(b) => Some(*b),
                    CellValue::Int(0) => Some(false),
                    CellValue::Int(1) => Some(true),
                    CellValue::Number(n) if *n == 0.0 => Some(false),
                    CellValue::Number(n) if *n == 1.0 => Some(true),
                    CellValue::Text(t) => self.config.parse_bool(t),
                    _ => None,
                };
                b.map(DataValue::Bool).ok_or_else(|| invalid(p.name(), value, loc))
            }
            PrimitiveType::Byte => {
                let i = integer(value).ok_or_else(|| invalid(p.name(), value, loc))?;
                u8::try_from(i)
                    .map(DataValue::Byte)
                    .map_err(|_| out_of_range(p.name(), value, loc))
            }
            PrimitiveType::Short => {
                let i = integer(value).ok_or_else(|| invalid(p.name(), value, loc))?;
                i16::try_from(i)
                    .map(DataValue::Short)
                    .map_err(|_| out_of_range(p.name(), value, loc))
            }
            PrimitiveType::Int => {
                let i = integer(value).ok_or_else(|| invalid(p.name(), value, loc))?;
                i32::try_from(i)
                    .map(DataValue::Int)
                    .map_err(|_| out_of_range(p.name(), value, loc))
            }
            PrimitiveType::Long => integer(value)
                .map(DataValue::Long)
                .ok_or_else(|| invalid(p.name(), value, loc)),
            PrimitiveType::Float => {
                let f = float(value).ok_or_else(|| invalid(p.name(), value, loc))?;
                let narrowed = f as f32;
                if f.is_finite() && !narrowed.is_finite() {
                    return Err(out_of_range(p.name(), value, loc));
                }
                Ok(DataValue::Float(narrowed))
            }
            PrimitiveType::Double => float(value)
                .map(DataValue::Double)
                .ok_or_else(|| invalid(p.name(), value, loc)),
            PrimitiveType::String => Ok(DataValue::String(match value {
                CellValue::Text(s) if self.config.trim_strings => s.trim().to_string(),
                CellValue::Text(s) => s.clone(),
                other => other.to_text(),
            })),
            PrimitiveType::DateTime => self
                .datetime(value)
                .map(DataValue::DateTime)
                .ok_or_else(|| invalid(p.name(), value, loc)),
        }
    }

    fn datetime(&self, value: &CellValue) -> Option<NaiveDateTime> {
        match value {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            CellValue::Int(i) => self.config.date_system.serial_to_datetime(*i as f64),
            CellValue::Number(n) => self.config.date_system.serial_to_datetime(*n),
            CellValue::Text(t) => {
                let t = t.trim();
                self.config.datetime_formats.iter().find_map(|fmt| {
                    NaiveDateTime::parse_from_str(t, fmt).ok().or_else(|| {
                        NaiveDate::parse_from_str(t, fmt)
                            .ok()
                            .map(|d| d.and_time(NaiveTime::MIN))
                    })
                })
            }
            _ => None,
        }
    }
}

fn integer(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Int(i) => Some(*i),
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.2e18 => Some(*n as i64),
        CellValue::Text(t) => {
            let t = t.trim();
            t.parse::<i64>().ok().or_else(|| {
                t.parse::<f64>()
                    .ok()
                    .filter(|n| n.fract() == 0.0 && n.abs() < 9.2e18)
                    .map(|n| n as i64)
            })
        }
        _ => None,
    }
}

fn float(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Int(i) => Some(*i as f64),
        CellValue::Number(n) => Some(*n),
        CellValue::Text(t) => t.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn zero_value(p: PrimitiveType) -> DataValue {
    match p {
        PrimitiveType::Bool => DataValue::Bool(false),
        PrimitiveType::Byte => DataValue::Byte(0),
        PrimitiveType::Short => DataValue::Short(0),
        PrimitiveType::Int => DataValue::Int(0),
        PrimitiveType::Long => DataValue::Long(0),
        PrimitiveType::Float => DataValue::Float(0.0),
        PrimitiveType::Double => DataValue::Double(0.0),
        PrimitiveType::String => DataValue::String(String::new()),
        PrimitiveType::DateTime => DataValue::DateTime(NaiveDateTime::default()),
    }
}

/// A collection element with the cell it started at.
enum Entry {
    Value(DataValue, CellLocation),
    Pair(DataValue, DataValue, CellLocation),
}

fn finish_collection(kind: &CollectionKind, entries: Vec<Entry>) -> CreateResult<DataValue> {
    let values = |entries: Vec<Entry>| -> Vec<(DataValue, CellLocation)> {
        entries
            .into_iter()
            .filter_map(|e| match e {
                Entry::Value(v, loc) => Some((v, loc)),
                Entry::Pair(..) => None,
            })
            .collect()
    };

    match kind {
        CollectionKind::List => Ok(DataValue::List(
            values(entries).into_iter().map(|(v, _)| v).collect(),
        )),
        CollectionKind::Array => Ok(DataValue::Array(
            values(entries).into_iter().map(|(v, _)| v).collect(),
        )),
        CollectionKind::Set => {
            let mut seen = FxHashSet::default();
            let mut out = Vec::new();
            for (value, loc) in values(entries) {
                let key = value.to_string();
                if !seen.insert(key.clone()) {
                    return Err(data_err(
                        DataCreateErrorKind::DuplicateElement { value: key },
                        loc,
                    ));
                }
                out.push(value);
            }
            Ok(DataValue::Set(out))
        }
        CollectionKind::Map { .. } => {
            let mut seen = FxHashSet::default();
            let mut out = Vec::new();
            for entry in entries {
                let Entry::Pair(k, v, loc) = entry else {
                    continue;
                };
                let key = k.to_string();
                if !seen.insert(key.clone()) {
                    return Err(data_err(DataCreateErrorKind::DuplicateKey { key }, loc));
                }
                out.push((k, v));
            }
            Ok(DataValue::Map(out))
        }
    }
}
