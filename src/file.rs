//! The root container: opening and creating files, serially or bound to an
//! MPI communicator.

use std::ops::Deref;
use std::path::Path;

use anyhow::Context;
use hdf5_sys::h5f::{H5Fcreate, H5Fopen, H5F_ACC_RDWR, H5F_ACC_TRUNC};
use hdf5_sys::h5p::H5P_DEFAULT;
use log::debug;

#[cfg(feature = "mpio")]
use std::mem::MaybeUninit;

#[cfg(feature = "mpio")]
use hdf5_sys::h5p::{H5Pcreate, H5Pset_fapl_mpio, H5P_CLS_FILE_ACCESS};
#[cfg(feature = "mpio")]
use mpi::traits::*;

#[cfg(feature = "mpio")]
use crate::handle::h5check;
use crate::group::Group;
use crate::handle::{to_cstring, Handle, Kind};
use crate::object::Object;

/// An HDF5 file opened for read-write, acting as the root [`Group`].
#[derive(Debug)]
pub struct File {
    root: Group,
}

impl Deref for File {
    type Target = Group;

    fn deref(&self) -> &Group {
        &self.root
    }
}

impl File {
    /// Create a new file, truncating any existing one.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<File, anyhow::Error> {
        File::with_access(path.as_ref(), Handle::borrowed(H5P_DEFAULT), false, true)
    }

    /// Open an existing file for read-write.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<File, anyhow::Error> {
        File::with_access(path.as_ref(), Handle::borrowed(H5P_DEFAULT), false, false)
    }

    /// Create a new file for collective access by every rank of `comm`.
    ///
    /// The call itself is collective: every rank of the communicator must
    /// make it, and every data operation on datasets under this file becomes
    /// collective as well.
    #[cfg(feature = "mpio")]
    pub fn create_parallel<P, C>(path: P, comm: &C) -> Result<File, anyhow::Error>
    where
        P: AsRef<Path>,
        C: Communicator,
    {
        File::with_access(path.as_ref(), mpio_access(comm)?, true, true)
    }

    /// Open an existing file for collective read-write access by every rank
    /// of `comm`.
    #[cfg(feature = "mpio")]
    pub fn open_parallel<P, C>(path: P, comm: &C) -> Result<File, anyhow::Error>
    where
        P: AsRef<Path>,
        C: Communicator,
    {
        File::with_access(path.as_ref(), mpio_access(comm)?, true, false)
    }

    fn with_access(
        path: &Path,
        access: Handle,
        mpi: bool,
        truncate: bool,
    ) -> Result<File, anyhow::Error> {
        let name = path
            .to_str()
            .ok_or_else(|| anyhow!("non-UTF-8 path: {:?}", path))?;
        let cname = to_cstring(name)?;

        let handle = if truncate {
            Handle::try_new(
                unsafe { H5Fcreate(cname.as_ptr(), H5F_ACC_TRUNC, H5P_DEFAULT, access.id()) },
                Kind::File,
            )
            .with_context(|| format!("could not create file {:?}", path))?
        } else {
            Handle::try_new(
                unsafe { H5Fopen(cname.as_ptr(), H5F_ACC_RDWR, access.id()) },
                Kind::File,
            )
            .with_context(|| format!("could not open file {:?}", path))?
        };
        // The access list only steers this one call; its effect is recorded
        // by the opened handle, so it is released right away.
        drop(access);
        debug!(
            "{} file {:?} (collective: {})",
            if truncate { "created" } else { "opened" },
            path,
            mpi
        );

        Ok(File {
            root: Group::from_object(Object::new(name.to_owned(), mpi, handle)),
        })
    }
}

/// File-access property list bound to the MPI communicator. Everything the
/// communicator implies for collective I/O is configured here.
#[cfg(feature = "mpio")]
fn mpio_access<C: Communicator>(comm: &C) -> Result<Handle, anyhow::Error> {
    let access = Handle::try_new(
        unsafe { H5Pcreate(*H5P_CLS_FILE_ACCESS) },
        Kind::PropertyList,
    )?;
    // MPI_Info_free resets the handle to MPI_INFO_NULL, which is what the
    // mpio driver expects when no hints are passed.
    let info = unsafe {
        let mut info = MaybeUninit::uninit();
        mpi::ffi::MPI_Info_create(info.as_mut_ptr());
        let mut info = info.assume_init();
        mpi::ffi::MPI_Info_free(&mut info);
        info
    };
    h5check!(H5Pset_fapl_mpio(access.id(), comm.as_raw(), info))?;
    Ok(access)
}
