//! Per-vertex scalar fields with typed storage.
//!
//! The storage type of a field matters to the ray caster: integral fields
//! with a small range get an exact one-entry-per-value color table, while
//! everything else is quantized into 65536 buckets. [`ScalarData`] keeps the
//! values in their native type; [`dispatch_scalars!`] selects the concrete
//! [`ScalarArray`] once so hot loops run against a monomorphized accessor.

use tetray_core::{ModifiedTime, ObjectId, Result, TetrayError, Tracked};

/// Numeric storage type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ScalarType {
    /// Whether values of this type are integers.
    pub fn is_integral(self) -> bool {
        !matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::U8 => "u8",
            ScalarType::I8 => "i8",
            ScalarType::U16 => "u16",
            ScalarType::I16 => "i16",
            ScalarType::U32 => "u32",
            ScalarType::I32 => "i32",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }
}

/// An element type a scalar field can be stored as.
pub trait Scalar: Copy + Send + Sync + 'static {
    /// The runtime tag for this type.
    const TYPE: ScalarType;

    /// Widens the value for interpolation.
    fn to_f64(self) -> f64;

    /// Wraps a typed array in the [`ScalarData`] sum type.
    fn wrap(array: ScalarArray<Self>) -> ScalarData;
}

macro_rules! impl_scalar {
    ($t:ty, $variant:ident) => {
        impl Scalar for $t {
            const TYPE: ScalarType = ScalarType::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            fn wrap(array: ScalarArray<Self>) -> ScalarData {
                ScalarData::$variant(array)
            }
        }
    };
}

impl_scalar!(u8, U8);
impl_scalar!(i8, I8);
impl_scalar!(u16, U16);
impl_scalar!(i16, I16);
impl_scalar!(u32, U32);
impl_scalar!(i32, I32);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

/// Read access to interleaved per-vertex scalar tuples.
pub trait ScalarAccess {
    /// Number of components per vertex.
    fn num_components(&self) -> usize;

    /// Value of one component at one vertex.
    fn value(&self, vertex: usize, component: usize) -> f64;
}

/// Interleaved scalar tuples of one concrete type.
#[derive(Debug, Clone)]
pub struct ScalarArray<T: Scalar> {
    values: Vec<T>,
    components: usize,
    ranges: Vec<(f64, f64)>,
}

impl<T: Scalar> ScalarArray<T> {
    /// Creates an array of `values.len() / components` tuples.
    pub fn new(values: Vec<T>, components: usize) -> Result<Self> {
        if components == 0 {
            return Err(TetrayError::InvalidComponent(
                "scalar field needs at least one component".into(),
            ));
        }
        if values.len() % components != 0 {
            return Err(TetrayError::SizeMismatch {
                expected: values.len().next_multiple_of(components),
                actual: values.len(),
            });
        }
        let ranges = (0..components)
            .map(|c| compute_range(values.iter().skip(c).step_by(components).copied()))
            .collect();
        Ok(Self {
            values,
            components,
            ranges,
        })
    }

    /// Number of tuples (vertices).
    pub fn num_tuples(&self) -> usize {
        self.values.len() / self.components
    }

    /// Raw interleaved values.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Finite `(min, max)` of one component, `(0, 1)` if it has no finite values.
    pub fn range(&self, component: usize) -> (f64, f64) {
        self.ranges[component]
    }
}

impl<T: Scalar> ScalarAccess for ScalarArray<T> {
    fn num_components(&self) -> usize {
        self.components
    }

    #[inline]
    fn value(&self, vertex: usize, component: usize) -> f64 {
        self.values[vertex * self.components + component].to_f64()
    }
}

fn compute_range<T: Scalar>(values: impl Iterator<Item = T>) -> (f64, f64) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for v in values {
        let v = v.to_f64();
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min > max {
        (0.0, 1.0)
    } else {
        (min, max)
    }
}

/// A scalar array in its native storage type.
#[derive(Debug, Clone)]
pub enum ScalarData {
    U8(ScalarArray<u8>),
    I8(ScalarArray<i8>),
    U16(ScalarArray<u16>),
    I16(ScalarArray<i16>),
    U32(ScalarArray<u32>),
    I32(ScalarArray<i32>),
    F32(ScalarArray<f32>),
    F64(ScalarArray<f64>),
}

/// Runs an expression against the concrete [`ScalarArray`] inside a
/// [`ScalarData`], binding it to the given identifier.
///
/// ```rust
/// use tetray_structures::{dispatch_scalars, ScalarAccess, ScalarField};
///
/// let field = ScalarField::new(vec![1u8, 2, 3], 1).unwrap();
/// let sum: f64 = dispatch_scalars!(field.data(), array => {
///     (0..3).map(|v| array.value(v, 0)).sum()
/// });
/// assert_eq!(sum, 6.0);
/// ```
#[macro_export]
macro_rules! dispatch_scalars {
    ($data:expr, $array:ident => $body:expr) => {
        match $data {
            $crate::ScalarData::U8($array) => $body,
            $crate::ScalarData::I8($array) => $body,
            $crate::ScalarData::U16($array) => $body,
            $crate::ScalarData::I16($array) => $body,
            $crate::ScalarData::U32($array) => $body,
            $crate::ScalarData::I32($array) => $body,
            $crate::ScalarData::F32($array) => $body,
            $crate::ScalarData::F64($array) => $body,
        }
    };
}

impl ScalarData {
    /// Storage type tag.
    pub fn scalar_type(&self) -> ScalarType {
        dispatch_scalars!(self, a => scalar_type_of(a))
    }

    /// Number of components per vertex.
    pub fn num_components(&self) -> usize {
        dispatch_scalars!(self, a => a.num_components())
    }

    /// Number of tuples (vertices).
    pub fn num_tuples(&self) -> usize {
        dispatch_scalars!(self, a => a.num_tuples())
    }

    /// Range of one component.
    pub fn range(&self, component: usize) -> (f64, f64) {
        dispatch_scalars!(self, a => a.range(component))
    }
}

fn scalar_type_of<T: Scalar>(_array: &ScalarArray<T>) -> ScalarType {
    T::TYPE
}

/// A tracked per-vertex scalar field.
#[derive(Debug, Clone)]
pub struct ScalarField {
    id: ObjectId,
    mtime: ModifiedTime,
    data: ScalarData,
}

impl ScalarField {
    /// Creates a field from interleaved values with `components` values per vertex.
    pub fn new<T: Scalar>(values: Vec<T>, components: usize) -> Result<Self> {
        Ok(Self::from_data(T::wrap(ScalarArray::new(values, components)?)))
    }

    /// Wraps already-typed data.
    pub fn from_data(data: ScalarData) -> Self {
        Self {
            id: ObjectId::new(),
            mtime: ModifiedTime::now(),
            data,
        }
    }

    /// The typed data.
    pub fn data(&self) -> &ScalarData {
        &self.data
    }

    /// Replaces the values, keeping the field's identity.
    pub fn set_data(&mut self, data: ScalarData) {
        self.data = data;
        self.mtime.touch();
    }

    /// Storage type tag.
    pub fn scalar_type(&self) -> ScalarType {
        self.data.scalar_type()
    }

    /// Number of components per vertex.
    pub fn num_components(&self) -> usize {
        self.data.num_components()
    }

    /// Number of tuples (vertices).
    pub fn num_tuples(&self) -> usize {
        self.data.num_tuples()
    }

    /// Range of one component.
    pub fn range(&self, component: usize) -> (f64, f64) {
        self.data.range(component)
    }
}

impl Tracked for ScalarField {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn mtime(&self) -> ModifiedTime {
        self.mtime
    }
}
