//! Device meshes and tensor sharding annotations.
//!
//! A [`DeviceMesh`] organizes a flat set of devices into a named, multi-dimensional logical grid. Devices are laid out
//! in **row-major order** with respect to the axis list: for a mesh with axes `("x"=2, "y"=4)`, the device at mesh
//! coordinate `(i, j)` has logical index `i * 4 + j`. An optional logical device assignment maps these logical indices
//! to physical device ids.
//!
//! A [`ShardingSpec`] describes how each axis of a tensor is distributed across the axes of a mesh. Both render to the
//! textual [Shardy][shardy] syntax:
//!
//! ```text
//! sdy.mesh @mesh = <["x"=2, "y"=4]>
//! #sdy.sharding<@mesh, [{"x"}, {}, {?}, {"y":(2)2}]>
//! ```
//!
//! [shardy]: https://openxla.org/shardy/overview

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use crate::naming::{escape_string, is_identifier};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for device mesh and sharding definitions.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShardingError {
    /// Error returned when a mesh name is not a valid identifier.
    #[error("invalid mesh name '{name}'")]
    InvalidMeshName { name: String },

    /// Error returned when a mesh axis name is not a valid identifier.
    #[error("invalid mesh axis name '{axis_name}'")]
    InvalidMeshAxisName { axis_name: String },

    /// Error returned when a mesh axis has size `0`.
    #[error("mesh axis '{axis_name}' must have size > 0")]
    InvalidMeshAxisSize { axis_name: String },

    /// Error returned when mesh axis names are not unique.
    #[error("mesh axis '{axis_name}' appears more than once")]
    DuplicateMeshAxisName { axis_name: String },

    /// Error returned when the number of axis names does not match the number of axis sizes.
    #[error("got {name_count} mesh axis name(s) but {size_count} mesh axis size(s)")]
    AxisCountMismatch { name_count: usize, size_count: usize },

    /// Error returned when a logical device assignment does not have one entry per device.
    #[error("mesh has {expected_device_count} device(s), but the device assignment has {actual_device_count}")]
    MeshDeviceCountMismatch { expected_device_count: usize, actual_device_count: usize },

    /// Error returned when a logical device assignment refers to a device that does not exist.
    #[error("device id {device_id} is out of range for a mesh with {device_count} device(s)")]
    DeviceIdOutOfRange { device_id: usize, device_count: usize },

    /// Error returned when a logical device assignment refers to the same device more than once.
    #[error("device id {device_id} appears more than once in the device assignment")]
    DuplicateDeviceId { device_id: usize },

    /// Error returned when a sharding or a replica group computation references a mesh axis that does not exist.
    #[error("mesh '{mesh}' has no axis named '{axis_name}'")]
    UnknownMeshAxis { mesh: String, axis_name: String },

    /// Error returned when a sharded tensor axis references no mesh axes.
    #[error("sharding of tensor axis #{dimension} has an empty mesh-axis list")]
    EmptyPartitionAxisList { dimension: usize },

    /// Error returned when a mesh axis is used more than once.
    #[error("mesh axis '{axis_name}' is used more than once")]
    DuplicatePartitionAxis { axis_name: String },

    /// Error returned when a sub-axis does not evenly divide its mesh axis.
    #[error("sub-axis '{axis_name}':({pre_size}){size} does not divide mesh axis size {axis_size}")]
    InvalidSubAxis { axis_name: String, pre_size: usize, size: usize, axis_size: usize },

    /// Error returned when arithmetic overflows.
    #[error("overflow while {context}")]
    Overflow { context: String },
}

// ---------------------------------------------------------------------------
// Mesh
// ---------------------------------------------------------------------------

/// A named axis in a [`DeviceMesh`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeshAxis {
    name: String,
    size: usize,
}

impl MeshAxis {
    /// Creates a mesh axis. The name must be a valid identifier and the size must be positive.
    pub fn new<N: Into<String>>(name: N, size: usize) -> Result<Self, ShardingError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(ShardingError::InvalidMeshAxisName { axis_name: name });
        }
        if size == 0 {
            return Err(ShardingError::InvalidMeshAxisSize { axis_name: name });
        }
        Ok(Self { name, size })
    }

    /// Name of this axis.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Size of this axis.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Named logical mesh of devices.
///
/// # Examples
///
/// ```rust
/// # use ryft_stablehlo::sharding::DeviceMesh;
/// let mesh = DeviceMesh::new("mesh", &["x", "y"], &[2, 2]).unwrap();
/// assert_eq!(mesh.device_count(), 4);
/// assert_eq!(mesh.compute_replica_groups(&["y"]).unwrap(), vec![vec![0, 1], vec![2, 3]]);
/// assert_eq!(mesh.compute_replica_groups(&["x"]).unwrap(), vec![vec![0, 2], vec![1, 3]]);
/// assert_eq!(mesh.wire_declaration(), "sdy.mesh @mesh = <[\"x\"=2, \"y\"=2]>");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceMesh {
    name: String,
    axes: Vec<MeshAxis>,
    axis_index_by_name: HashMap<String, usize>,
    device_count: usize,
    logical_device_assignment: Option<Vec<usize>>,
}

impl DeviceMesh {
    /// Creates a new mesh with the identity logical device assignment.
    ///
    /// The mesh name and every axis name must be valid identifiers, `axis_names` and `axis_sizes` must have the same
    /// length, axis names must be unique, and axis sizes must be positive. An empty axis list describes a mesh with a
    /// single device.
    pub fn new<N: Into<String>, A: AsRef<str>>(
        name: N,
        axis_names: &[A],
        axis_sizes: &[usize],
    ) -> Result<Self, ShardingError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(ShardingError::InvalidMeshName { name });
        }
        if axis_names.len() != axis_sizes.len() {
            return Err(ShardingError::AxisCountMismatch {
                name_count: axis_names.len(),
                size_count: axis_sizes.len(),
            });
        }
        let mut axes = Vec::with_capacity(axis_names.len());
        let mut axis_index_by_name = HashMap::with_capacity(axis_names.len());
        for (axis_index, (axis_name, axis_size)) in axis_names.iter().zip(axis_sizes).enumerate() {
            let axis = MeshAxis::new(axis_name.as_ref(), *axis_size)?;
            if axis_index_by_name.insert(axis.name.clone(), axis_index).is_some() {
                return Err(ShardingError::DuplicateMeshAxisName { axis_name: axis.name });
            }
            axes.push(axis);
        }
        let device_count = axes.iter().try_fold(1usize, |count, axis| {
            count.checked_mul(axis.size).ok_or_else(|| ShardingError::Overflow {
                context: "computing mesh device count from axis sizes".to_string(),
            })
        })?;
        Ok(Self { name, axes, axis_index_by_name, device_count, logical_device_assignment: None })
    }

    /// Returns a copy of this mesh that maps the logical device with index `i` to the physical device with id
    /// `device_ids[i]`. `device_ids` must be a permutation of `0..device_count`.
    pub fn with_logical_device_assignment(mut self, device_ids: Vec<usize>) -> Result<Self, ShardingError> {
        if device_ids.len() != self.device_count {
            return Err(ShardingError::MeshDeviceCountMismatch {
                expected_device_count: self.device_count,
                actual_device_count: device_ids.len(),
            });
        }
        let mut seen = vec![false; self.device_count];
        for device_id in &device_ids {
            match seen.get_mut(*device_id) {
                None => {
                    return Err(ShardingError::DeviceIdOutOfRange {
                        device_id: *device_id,
                        device_count: self.device_count,
                    });
                }
                Some(true) => return Err(ShardingError::DuplicateDeviceId { device_id: *device_id }),
                Some(seen) => *seen = true,
            }
        }
        self.logical_device_assignment = Some(device_ids);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn axes(&self) -> &[MeshAxis] {
        self.axes.as_slice()
    }

    /// Returns the total number of devices, which is the product of all axis sizes.
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Returns the index of `axis_name` in this mesh, if present.
    pub fn axis_index<S: AsRef<str>>(&self, axis_name: S) -> Option<usize> {
        self.axis_index_by_name.get(axis_name.as_ref()).copied()
    }

    /// Returns the size of `axis_name` in this mesh, if present.
    pub fn axis_size<S: AsRef<str>>(&self, axis_name: S) -> Option<usize> {
        self.axis_index(axis_name).map(|axis_index| self.axes[axis_index].size)
    }

    /// Returns the physical device id of every logical device, in logical order.
    pub fn device_ids(&self) -> Vec<usize> {
        match &self.logical_device_assignment {
            Some(device_ids) => device_ids.clone(),
            None => (0..self.device_count).collect(),
        }
    }

    /// Returns `true` if this mesh maps every logical device to the physical device with the same id.
    pub fn has_identity_device_assignment(&self) -> bool {
        self.logical_device_assignment
            .as_ref()
            .is_none_or(|device_ids| device_ids.iter().enumerate().all(|(index, device_id)| index == *device_id))
    }

    /// Partitions the devices of this mesh into replica groups for collectives that communicate over `axis_names`.
    ///
    /// Devices that share the same coordinate along every axis that is *not* listed in `axis_names` form one group.
    /// Groups are ordered by the row-major index of that shared coordinate and the members of each group are ordered
    /// by their row-major logical index. Members are reported as physical device ids (i.e., after applying the logical
    /// device assignment).
    pub fn compute_replica_groups<S: AsRef<str>>(&self, axis_names: &[S]) -> Result<Vec<Vec<i64>>, ShardingError> {
        let mut listed = vec![false; self.axes.len()];
        for axis_name in axis_names {
            let axis_name = axis_name.as_ref();
            let axis_index = self.axis_index(axis_name).ok_or_else(|| ShardingError::UnknownMeshAxis {
                mesh: self.name.clone(),
                axis_name: axis_name.to_string(),
            })?;
            if std::mem::replace(&mut listed[axis_index], true) {
                return Err(ShardingError::DuplicatePartitionAxis { axis_name: axis_name.to_string() });
            }
        }

        let axis_sizes = self.axes.iter().map(MeshAxis::size).collect::<Vec<_>>();
        let group_size =
            self.axes.iter().zip(&listed).filter(|(_, listed)| **listed).map(|(axis, _)| axis.size).product::<usize>();
        let device_ids = self.device_ids();
        let mut groups = vec![Vec::with_capacity(group_size); self.device_count / group_size];
        for (logical_index, device_id) in device_ids.iter().enumerate() {
            let coordinate = coordinate_for_linear_index(logical_index, axis_sizes.as_slice());
            let group_index = coordinate
                .iter()
                .zip(&axis_sizes)
                .zip(&listed)
                .filter(|(_, listed)| !**listed)
                .fold(0, |index, ((coordinate, size), _)| index * size + coordinate);
            groups[group_index].push(*device_id as i64);
        }
        Ok(groups)
    }

    /// Renders this mesh as the right-hand side of a Shardy `sdy.mesh` declaration (e.g., `<["x"=8, "y"=2]>`).
    pub fn wire_literal(&self) -> String {
        let axes = self
            .axes
            .iter()
            .map(|axis| format!("\"{}\"={}", escape_string(axis.name()), axis.size()))
            .collect::<Vec<_>>()
            .join(", ");
        if self.has_identity_device_assignment() {
            format!("<[{axes}]>")
        } else {
            let device_ids = self.device_ids().iter().map(usize::to_string).collect::<Vec<_>>().join(", ");
            format!("<[{axes}], device_ids=[{device_ids}]>")
        }
    }

    /// Renders the complete Shardy `sdy.mesh` declaration of this mesh.
    pub fn wire_declaration(&self) -> String {
        format!("sdy.mesh @{} = {}", self.name, self.wire_literal())
    }
}

// ---------------------------------------------------------------------------
// Sharding specification
// ---------------------------------------------------------------------------

/// Reference to a mesh axis, or to a contiguous slice of one, that a tensor axis is sharded over.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshAxisRef {
    Axis(String),

    /// Sub-axis of size `size` of the mesh axis `name`, which skips the `pre_size` major sub-axes of that mesh axis.
    /// `pre_size * size` must divide the size of the mesh axis.
    SubAxis { name: String, pre_size: usize, size: usize },
}

impl MeshAxisRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Axis(name) | Self::SubAxis { name, .. } => name.as_str(),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Axis(name) => format!("\"{}\"", escape_string(name)),
            Self::SubAxis { name, pre_size, size } => format!("\"{}\":({pre_size}){size}", escape_string(name)),
        }
    }
}

/// Sharding of a single tensor axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AxisSharding {
    /// The tensor axis is replicated. Rendered as the closed dimension sharding `{}`.
    Replicated,

    /// The sharding of the tensor axis is left for the compiler to decide. Rendered as the open dimension sharding
    /// `{?}`.
    Open,

    /// The tensor axis is sharded along the product of the provided mesh axes, from major to minor.
    Sharded(Vec<MeshAxisRef>),
}

impl AxisSharding {
    pub fn replicated() -> Self {
        Self::Replicated
    }

    pub fn open() -> Self {
        Self::Open
    }

    pub fn sharded<N: Into<String>>(axis_name: N) -> Self {
        Self::Sharded(vec![MeshAxisRef::Axis(axis_name.into())])
    }

    pub fn sharded_by<I, N>(axis_names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self::Sharded(axis_names.into_iter().map(|name| MeshAxisRef::Axis(name.into())).collect())
    }

    pub fn sub_axis<N: Into<String>>(axis_name: N, pre_size: usize, size: usize) -> Self {
        Self::Sharded(vec![MeshAxisRef::SubAxis { name: axis_name.into(), pre_size, size }])
    }

    fn render(&self) -> String {
        match self {
            Self::Replicated => "{}".to_string(),
            Self::Open => "{?}".to_string(),
            Self::Sharded(axes) => {
                format!("{{{}}}", axes.iter().map(MeshAxisRef::render).collect::<Vec<_>>().join(", "))
            }
        }
    }
}

/// Sharding of a tensor over a [`DeviceMesh`]. Tensor axes beyond the ones listed in the specification are
/// replicated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardingSpec {
    mesh: Arc<DeviceMesh>,
    axes: Vec<AxisSharding>,
}

impl ShardingSpec {
    /// Creates a new [`ShardingSpec`], validating every mesh axis reference against `mesh`.
    pub fn new(mesh: Arc<DeviceMesh>, axes: Vec<AxisSharding>) -> Result<Self, ShardingError> {
        let spec = Self { mesh, axes };
        spec.validate()?;
        Ok(spec)
    }

    /// Creates a [`ShardingSpec`] that replicates a tensor on every device of `mesh`.
    pub fn replicated(mesh: Arc<DeviceMesh>) -> Self {
        Self { mesh, axes: Vec::new() }
    }

    pub fn mesh(&self) -> &Arc<DeviceMesh> {
        &self.mesh
    }

    pub fn axes(&self) -> &[AxisSharding] {
        self.axes.as_slice()
    }

    /// Number of tensor axes that this specification explicitly shards.
    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    /// Checks that every referenced mesh axis exists, that no mesh axis is used more than once, and that every sub-axis
    /// evenly divides its mesh axis without overlapping another sub-axis of the same mesh axis.
    pub fn validate(&self) -> Result<(), ShardingError> {
        let mut full_axes = HashSet::new();
        let mut sub_axes = HashMap::<&str, Vec<(usize, usize)>>::new();
        for (dimension, sharding) in self.axes.iter().enumerate() {
            let AxisSharding::Sharded(references) = sharding else {
                continue;
            };
            if references.is_empty() {
                return Err(ShardingError::EmptyPartitionAxisList { dimension });
            }
            for reference in references {
                let axis_name = reference.name();
                let axis_size = self.mesh.axis_size(axis_name).ok_or_else(|| ShardingError::UnknownMeshAxis {
                    mesh: self.mesh.name.clone(),
                    axis_name: axis_name.to_string(),
                })?;
                let unique = match reference {
                    MeshAxisRef::Axis(name) => !sub_axes.contains_key(name.as_str()) && full_axes.insert(name.clone()),
                    MeshAxisRef::SubAxis { name, pre_size, size } => {
                        let divides = *pre_size > 0
                            && *size > 0
                            && pre_size.checked_mul(*size).is_some_and(|product| axis_size % product == 0);
                        if !divides {
                            return Err(ShardingError::InvalidSubAxis {
                                axis_name: name.clone(),
                                pre_size: *pre_size,
                                size: *size,
                                axis_size,
                            });
                        }
                        // Sub-axes of the same mesh axis must cover disjoint ranges `[pre_size, pre_size * size)`.
                        let range = (*pre_size, pre_size * size);
                        let ranges = sub_axes.entry(name.as_str()).or_default();
                        let disjoint = ranges.iter().all(|(start, end)| range.1 <= *start || *end <= range.0);
                        ranges.push(range);
                        !full_axes.contains(name) && disjoint
                    }
                };
                if !unique {
                    return Err(ShardingError::DuplicatePartitionAxis { axis_name: axis_name.to_string() });
                }
            }
        }
        Ok(())
    }

    /// Renders this specification as a Shardy tensor sharding attribute for a tensor of rank `rank`, padding the
    /// unlisted trailing axes with replicated dimension shardings.
    pub fn wire_attribute(&self, rank: usize) -> String {
        let dimensions = (0..rank.max(self.axes.len()))
            .map(|dimension| self.axes.get(dimension).unwrap_or(&AxisSharding::Replicated).render())
            .collect::<Vec<_>>()
            .join(", ");
        format!("#sdy.sharding<@{}, [{dimensions}]>", self.mesh.name)
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// How a program is distributed across devices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Distribution {
    /// SPMD program that is replicated `replicas` times, with each replica partitioned across `partitions` devices.
    Replicated { replicas: usize, partitions: usize },

    /// Program partitioned over one or more device meshes. All meshes must have the same device count.
    Meshes(Vec<Arc<DeviceMesh>>),
}

impl Distribution {
    /// Returns the number of replicas and the number of partitions of this distribution.
    pub fn replicas_and_partitions(&self) -> (usize, usize) {
        match self {
            Self::Replicated { replicas, partitions } => (*replicas, *partitions),
            Self::Meshes(meshes) => (1, meshes.first().map_or(1, |mesh| mesh.device_count())),
        }
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn coordinate_for_linear_index(mut index: usize, axis_sizes: &[usize]) -> Vec<usize> {
    let mut coordinate = vec![0usize; axis_sizes.len()];
    for axis in (0..axis_sizes.len()).rev() {
        let axis_size = axis_sizes[axis];
        coordinate[axis] = index % axis_size;
        index /= axis_size;
    }
    coordinate
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn test_mesh_2x2() -> Arc<DeviceMesh> {
        Arc::new(DeviceMesh::new("mesh", &["x", "y"], &[2, 2]).unwrap())
    }

    #[test]
    fn test_device_mesh_construction_and_lookups() {
        let mesh = DeviceMesh::new("mesh", &["x", "y"], &[2, 4]).unwrap();
        assert_eq!(mesh.name(), "mesh");
        assert_eq!(mesh.axes().len(), 2);
        assert_eq!(mesh.axis_index("x"), Some(0));
        assert_eq!(mesh.axis_index("y"), Some(1));
        assert_eq!(mesh.axis_index("z"), None);
        assert_eq!(mesh.axis_size("y"), Some(4));
        assert_eq!(mesh.device_count(), 8);
        assert_eq!(DeviceMesh::new("single", &[] as &[&str], &[]).unwrap().device_count(), 1);
    }

    #[test]
    fn test_device_mesh_validation() {
        assert!(matches!(
            DeviceMesh::new("mesh", &["x", "x"], &[2, 3]),
            Err(ShardingError::DuplicateMeshAxisName { axis_name }) if axis_name == "x",
        ));
        assert!(matches!(
            DeviceMesh::new("mesh", &["x"], &[2, 3]),
            Err(ShardingError::AxisCountMismatch { name_count: 1, size_count: 2 }),
        ));
        assert!(matches!(
            DeviceMesh::new("mesh", &["x"], &[0]),
            Err(ShardingError::InvalidMeshAxisSize { axis_name }) if axis_name == "x",
        ));
        assert!(matches!(
            DeviceMesh::new("mesh", &["my axis"], &[2]),
            Err(ShardingError::InvalidMeshAxisName { .. }),
        ));
        assert!(matches!(DeviceMesh::new("", &["x"], &[2]), Err(ShardingError::InvalidMeshName { .. })));
        assert!(matches!(DeviceMesh::new("1mesh", &["x"], &[2]), Err(ShardingError::InvalidMeshName { .. })));
        assert!(matches!(
            DeviceMesh::new("mesh", &["x", "y"], &[usize::MAX, 2]),
            Err(ShardingError::Overflow { .. }),
        ));
    }

    #[test]
    fn test_device_mesh_logical_device_assignment() {
        let mesh = DeviceMesh::new("mesh", &["x", "y"], &[2, 2]).unwrap();
        assert!(mesh.has_identity_device_assignment());
        let mesh = mesh.with_logical_device_assignment(vec![0, 2, 1, 3]).unwrap();
        assert!(!mesh.has_identity_device_assignment());
        assert_eq!(mesh.device_ids(), vec![0, 2, 1, 3]);
        assert_eq!(mesh.wire_declaration(), "sdy.mesh @mesh = <[\"x\"=2, \"y\"=2], device_ids=[0, 2, 1, 3]>");
        assert_eq!(mesh.compute_replica_groups(&["y"]).unwrap(), vec![vec![0, 2], vec![1, 3]]);

        let mesh = DeviceMesh::new("mesh", &["x"], &[3]).unwrap();
        assert!(matches!(
            mesh.clone().with_logical_device_assignment(vec![0, 1]),
            Err(ShardingError::MeshDeviceCountMismatch { expected_device_count: 3, actual_device_count: 2 }),
        ));
        assert!(matches!(
            mesh.clone().with_logical_device_assignment(vec![0, 1, 3]),
            Err(ShardingError::DeviceIdOutOfRange { device_id: 3, device_count: 3 }),
        ));
        assert!(matches!(
            mesh.clone().with_logical_device_assignment(vec![0, 1, 1]),
            Err(ShardingError::DuplicateDeviceId { device_id: 1 }),
        ));
        assert!(mesh.with_logical_device_assignment(vec![0, 1, 2]).unwrap().has_identity_device_assignment());
    }

    #[test]
    fn test_device_mesh_replica_groups() {
        let mesh = DeviceMesh::new("mesh", &["x", "y", "z"], &[2, 3, 2]).unwrap();
        assert_eq!(
            mesh.compute_replica_groups(&["x"]).unwrap(),
            vec![vec![0, 6], vec![1, 7], vec![2, 8], vec![3, 9], vec![4, 10], vec![5, 11]],
        );
        assert_eq!(
            mesh.compute_replica_groups(&["y"]).unwrap(),
            vec![vec![0, 2, 4], vec![1, 3, 5], vec![6, 8, 10], vec![7, 9, 11]],
        );
        assert_eq!(
            mesh.compute_replica_groups(&["z", "x"]).unwrap(),
            vec![vec![0, 1, 6, 7], vec![2, 3, 8, 9], vec![4, 5, 10, 11]],
        );
        assert_eq!(mesh.compute_replica_groups(&["x", "y", "z"]).unwrap(), vec![(0..12).collect::<Vec<i64>>()]);
        assert_eq!(mesh.compute_replica_groups(&[] as &[&str]).unwrap().len(), 12);
        assert!(matches!(
            mesh.compute_replica_groups(&["w"]),
            Err(ShardingError::UnknownMeshAxis { axis_name, .. }) if axis_name == "w",
        ));
        assert!(matches!(
            mesh.compute_replica_groups(&["x", "x"]),
            Err(ShardingError::DuplicatePartitionAxis { .. }),
        ));
    }

    #[test]
    fn test_sharding_spec_rendering() {
        let mesh = test_mesh_2x2();
        let spec =
            ShardingSpec::new(mesh.clone(), vec![AxisSharding::sharded("x"), AxisSharding::replicated()]).unwrap();
        assert_eq!(spec.wire_attribute(2), "#sdy.sharding<@mesh, [{\"x\"}, {}]>");
        assert_eq!(spec.wire_attribute(3), "#sdy.sharding<@mesh, [{\"x\"}, {}, {}]>");

        let spec = ShardingSpec::new(mesh.clone(), vec![AxisSharding::sharded_by(["x", "y"]), AxisSharding::open()])
            .unwrap();
        assert_eq!(spec.wire_attribute(2), "#sdy.sharding<@mesh, [{\"x\", \"y\"}, {?}]>");

        let mesh = Arc::new(DeviceMesh::new("mesh", &["x"], &[4]).unwrap());
        let spec =
            ShardingSpec::new(mesh.clone(), vec![AxisSharding::sub_axis("x", 1, 2), AxisSharding::sub_axis("x", 2, 2)])
                .unwrap();
        assert_eq!(spec.wire_attribute(2), "#sdy.sharding<@mesh, [{\"x\":(1)2}, {\"x\":(2)2}]>");
        assert_eq!(ShardingSpec::replicated(mesh).wire_attribute(1), "#sdy.sharding<@mesh, [{}]>");
    }

    #[test]
    fn test_sharding_spec_validation() {
        let mesh = test_mesh_2x2();
        assert!(matches!(
            ShardingSpec::new(mesh.clone(), vec![AxisSharding::sharded("z")]),
            Err(ShardingError::UnknownMeshAxis { axis_name, .. }) if axis_name == "z",
        ));
        assert!(matches!(
            ShardingSpec::new(mesh.clone(), vec![AxisSharding::sharded("x"), AxisSharding::sharded("x")]),
            Err(ShardingError::DuplicatePartitionAxis { axis_name }) if axis_name == "x",
        ));
        assert!(matches!(
            ShardingSpec::new(mesh.clone(), vec![AxisSharding::Sharded(vec![])]),
            Err(ShardingError::EmptyPartitionAxisList { dimension: 0 }),
        ));
        assert!(matches!(
            ShardingSpec::new(mesh.clone(), vec![AxisSharding::sub_axis("x", 2, 2)]),
            Err(ShardingError::InvalidSubAxis { axis_size: 2, .. }),
        ));
        assert!(matches!(
            ShardingSpec::new(mesh.clone(), vec![AxisSharding::sub_axis("x", 1, 0)]),
            Err(ShardingError::InvalidSubAxis { .. }),
        ));
        assert!(matches!(
            ShardingSpec::new(mesh, vec![AxisSharding::sharded("x"), AxisSharding::sub_axis("x", 1, 2)]),
            Err(ShardingError::DuplicatePartitionAxis { .. }),
        ));
    }

    #[test]
    fn test_sharding_spec_rejects_overlapping_sub_axes() {
        let mesh = Arc::new(DeviceMesh::new("mesh", &["x"], &[4]).unwrap());
        let sub_axes = |first: (usize, usize), second: (usize, usize)| {
            ShardingSpec::new(
                mesh.clone(),
                vec![AxisSharding::sub_axis("x", first.0, first.1), AxisSharding::sub_axis("x", second.0, second.1)],
            )
        };
        assert!(matches!(
            sub_axes((1, 2), (1, 4)),
            Err(ShardingError::DuplicatePartitionAxis { axis_name }) if axis_name == "x",
        ));
        assert!(matches!(sub_axes((2, 2), (1, 4)), Err(ShardingError::DuplicatePartitionAxis { .. })));
        assert!(matches!(sub_axes((1, 2), (1, 2)), Err(ShardingError::DuplicatePartitionAxis { .. })));
        assert!(sub_axes((2, 2), (1, 2)).is_ok());
    }

    #[test]
    fn test_distribution_replicas_and_partitions() {
        assert_eq!(Distribution::Replicated { replicas: 2, partitions: 4 }.replicas_and_partitions(), (2, 4));
        assert_eq!(Distribution::Meshes(vec![test_mesh_2x2()]).replicas_and_partitions(), (1, 4));
    }
}
