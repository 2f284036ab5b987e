use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::cpl::{self, CslStringList};
use crate::errors::{GdalError, Result};
use crate::raster::mdarray::attribute::{Attribute, AttributeTable, AttributeValue};
use crate::raster::mdarray::{Dimension, ExtendedDataType, MDArray};

/// A hierarchical namespace of dimensions, arrays, child groups and attributes.
///
/// Groups hand out shared handles: an array or dimension obtained from a group
/// stays usable for as long as any handle to it exists. Enumerations return
/// snapshots in creation order.
#[derive(Clone)]
pub struct Group<'a> {
    inner: Rc<GroupInner<'a>>,
}

struct GroupInner<'a> {
    name: String,
    full_name: String,
    writable: bool,
    dimensions: RefCell<Vec<Dimension<'a>>>,
    arrays: RefCell<Vec<MDArray<'a>>>,
    groups: RefCell<Vec<Group<'a>>>,
    attributes: AttributeTable,
}

const ARRAY_NAMES_OPTIONS: &[&str] = &["SHOW_ZERO_DIM", "SHOW_INDEXING"];

fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(cpl::report(GdalError::BadArgument(format!(
            "invalid {kind} name '{name}'"
        ))));
    }
    Ok(())
}

impl<'a> Group<'a> {
    pub(crate) fn new_root(writable: bool) -> Self {
        Self::new("/", "/".to_string(), writable)
    }

    fn new(name: &str, full_name: String, writable: bool) -> Self {
        Group {
            inner: Rc::new(GroupInner {
                name: name.to_string(),
                full_name,
                writable,
                dimensions: RefCell::new(Vec::new()),
                arrays: RefCell::new(Vec::new()),
                groups: RefCell::new(Vec::new()),
                attributes: AttributeTable::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn full_name(&self) -> &str {
        &self.inner.full_name
    }

    /// Whether dimensions, arrays, groups and attributes can be created in this group.
    pub fn is_writable(&self) -> bool {
        self.inner.writable
    }

    fn child_full_name(&self, name: &str) -> String {
        if self.inner.full_name == "/" {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.inner.full_name)
        }
    }

    fn check_writable(&self, what: &str) -> Result<()> {
        if !self.inner.writable {
            return Err(cpl::report(GdalError::NotSupported(format!(
                "cannot create {what} in read-only group '{}'",
                self.inner.full_name
            ))));
        }
        Ok(())
    }

    pub fn group_names(&self, _options: CslStringList) -> Vec<String> {
        self.inner
            .groups
            .borrow()
            .iter()
            .map(|g| g.name().to_string())
            .collect()
    }

    pub fn open_group(&self, name: &str, _options: CslStringList) -> Result<Group<'a>> {
        self.inner
            .groups
            .borrow()
            .iter()
            .find(|g| g.name() == name)
            .cloned()
            .ok_or_else(|| {
                cpl::report(GdalError::NotFound {
                    kind: "group",
                    name: name.to_string(),
                })
            })
    }

    pub fn create_group(&self, name: &str, options: CslStringList) -> Result<Group<'a>> {
        self.check_writable("group")?;
        check_name("group", name)?;
        options.warn_unknown_keys(&[], "CreateGroup()");

        let mut groups = self.inner.groups.borrow_mut();
        if groups.iter().any(|g| g.name() == name) {
            return Err(cpl::report(GdalError::AlreadyExists {
                kind: "group",
                name: name.to_string(),
            }));
        }
        let group = Group::new(name, self.child_full_name(name), self.inner.writable);
        groups.push(group.clone());
        Ok(group)
    }

    pub fn dimensions(&self, _options: CslStringList) -> Result<Vec<Dimension<'a>>> {
        Ok(self.inner.dimensions.borrow().clone())
    }

    /// Create a dimension. `dimension_type` and `direction` may be empty.
    pub fn create_dimension(
        &self,
        name: &str,
        dimension_type: &str,
        direction: &str,
        size: u64,
        options: CslStringList,
    ) -> Result<Dimension<'a>> {
        self.check_writable("dimension")?;
        check_name("dimension", name)?;
        options.warn_unknown_keys(&[], "CreateDimension()");
        self.add_dimension(Dimension::new(
            name,
            self.child_full_name(name),
            dimension_type,
            direction,
            size,
        ))
    }

    pub(crate) fn add_dimension(&self, dimension: Dimension<'a>) -> Result<Dimension<'a>> {
        let mut dimensions = self.inner.dimensions.borrow_mut();
        if dimensions.iter().any(|d| d.name() == dimension.name()) {
            return Err(cpl::report(GdalError::AlreadyExists {
                kind: "dimension",
                name: dimension.name().to_string(),
            }));
        }
        dimensions.push(dimension.clone());
        Ok(dimension)
    }

    /// Names of the arrays of this group, in creation order.
    ///
    /// # Options
    /// * `SHOW_ZERO_DIM=YES/NO`: include zero-dimensional arrays (default `YES`).
    /// * `SHOW_INDEXING=YES/NO`: include arrays that are the indexing variable of
    ///   a dimension of this group (default `YES`).
    pub fn array_names(&self, options: CslStringList) -> Vec<String> {
        options.warn_unknown_keys(ARRAY_NAMES_OPTIONS, "GetMDArrayNames()");
        let show_zero_dim = options.fetch_bool("SHOW_ZERO_DIM", true);
        let show_indexing = options.fetch_bool("SHOW_INDEXING", true);

        let indexing: Vec<MDArray<'a>> = self
            .inner
            .dimensions
            .borrow()
            .iter()
            .filter_map(Dimension::indexing_variable)
            .collect();

        self.inner
            .arrays
            .borrow()
            .iter()
            .filter(|a| show_zero_dim || a.num_dimensions() > 0)
            .filter(|a| show_indexing || !indexing.iter().any(|i| i.same_as(a)))
            .map(|a| a.name().to_string())
            .collect()
    }

    pub fn open_md_array(&self, name: &str, _options: CslStringList) -> Result<MDArray<'a>> {
        self.inner
            .arrays
            .borrow()
            .iter()
            .find(|a| a.name() == name)
            .cloned()
            .ok_or_else(|| {
                cpl::report(GdalError::NotFound {
                    kind: "array",
                    name: name.to_string(),
                })
            })
    }

    /// Create a zero-initialized array over `dimensions`.
    ///
    /// An empty `dimensions` slice creates a scalar (zero-dimensional) array.
    pub fn create_md_array(
        &self,
        name: &str,
        dimensions: &[Dimension<'a>],
        datatype: &ExtendedDataType,
        options: CslStringList,
    ) -> Result<MDArray<'a>> {
        self.check_writable("array")?;
        check_name("array", name)?;
        options.warn_unknown_keys(&[], "CreateMDArray()");

        if self.inner.arrays.borrow().iter().any(|a| a.name() == name) {
            return Err(cpl::report(GdalError::AlreadyExists {
                kind: "array",
                name: name.to_string(),
            }));
        }

        let array = MDArray::new_owned(
            name,
            self.child_full_name(name),
            dimensions.to_vec(),
            datatype.clone(),
        )?;
        self.inner.arrays.borrow_mut().push(array.clone());
        Ok(array)
    }

    pub(crate) fn add_md_array(&self, array: MDArray<'a>) -> Result<MDArray<'a>> {
        let mut arrays = self.inner.arrays.borrow_mut();
        if arrays.iter().any(|a| a.name() == array.name()) {
            return Err(cpl::report(GdalError::AlreadyExists {
                kind: "array",
                name: array.name().to_string(),
            }));
        }
        arrays.push(array.clone());
        Ok(array)
    }

    pub(crate) fn array_full_name(&self, name: &str) -> String {
        self.child_full_name(name)
    }

    pub fn attribute(&self, name: &str) -> Result<Attribute> {
        self.inner.attributes.get(name)
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.inner.attributes.list()
    }

    pub fn create_attribute(&self, name: &str, value: AttributeValue) -> Result<Attribute> {
        self.check_writable("attribute")?;
        self.inner.attributes.create(name, value)
    }
}

impl Debug for Group<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("full_name", &self.inner.full_name)
            .field("writable", &self.inner.writable)
            .finish()
    }
}
