//! Named containers of child groups and datasets.

use std::ops::Deref;

use anyhow::Context;
use hdf5_sys::h5g::{H5Gcreate2, H5Gopen2};
use hdf5_sys::h5p::H5P_DEFAULT;
use log::debug;
use ndarray::Array2;

use crate::dataset::Dataset;
use crate::datatype::Element;
use crate::handle::{to_cstring, Handle, Kind};
use crate::object::Object;

/// A named container of child groups and datasets.
#[derive(Debug, Clone)]
pub struct Group {
    object: Object,
}

impl Deref for Group {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.object
    }
}

impl Group {
    pub(crate) fn from_object(object: Object) -> Group {
        Group { object }
    }

    /// Open the existing child group `name`. Opening never creates: a
    /// missing name is an error.
    pub fn group(&self, name: &str) -> Result<Group, anyhow::Error> {
        let cname = to_cstring(name)?;
        let handle = Handle::try_new(
            unsafe { H5Gopen2(self.id(), cname.as_ptr(), H5P_DEFAULT) },
            Kind::Group,
        )
        .with_context(|| format!("no group {:?} under {:?}", name, self.name()))?;
        debug!("opened group {:?}", name);
        Ok(Group::from_object(Object::new(
            name.to_owned(),
            self.is_collective(),
            handle,
        )))
    }

    /// Create the child group `name`. An already existing name is an error.
    pub fn create_group(&self, name: &str) -> Result<Group, anyhow::Error> {
        let cname = to_cstring(name)?;
        let handle = Handle::try_new(
            unsafe {
                H5Gcreate2(
                    self.id(),
                    cname.as_ptr(),
                    H5P_DEFAULT,
                    H5P_DEFAULT,
                    H5P_DEFAULT,
                )
            },
            Kind::Group,
        )
        .with_context(|| format!("could not create group {:?} under {:?}", name, self.name()))?;
        debug!("created group {:?}", name);
        Ok(Group::from_object(Object::new(
            name.to_owned(),
            self.is_collective(),
            handle,
        )))
    }

    /// Create a new dataset of the given shape under this group.
    pub fn create_dataset<T: Element>(
        &self,
        name: &str,
        shape: &[usize],
    ) -> Result<Dataset<T>, anyhow::Error> {
        Dataset::create(self.id(), name, shape, self.is_collective())
    }

    /// Open the existing dataset `name`, checking that it stores `T`.
    pub fn dataset<T: Element>(&self, name: &str) -> Result<Dataset<T>, anyhow::Error> {
        Dataset::open(self.id(), name, self.is_collective())
    }

    /// Create a rank-1 dataset sized for `data` and write it, in one call.
    pub fn write_dataset<T: Element>(&self, name: &str, data: &[T]) -> Result<(), anyhow::Error> {
        let dataset = self.create_dataset::<T>(name, &[data.len()])?;
        dataset.write(data)
    }

    /// Create a rank-2 dataset shaped like `data` and write it, in one call.
    pub fn write_dataset_matrix<T: Element>(
        &self,
        name: &str,
        data: &Array2<T>,
    ) -> Result<(), anyhow::Error> {
        let dataset = self.create_dataset::<T>(name, &[data.nrows(), data.ncols()])?;
        dataset.write_matrix(data)
    }
}
