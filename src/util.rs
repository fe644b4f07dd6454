use std::os::unix::io::RawFd;
use std::{io, mem, ptr};

/// `setsockopt` wrapper
///
/// Passes `val` to the kernel by pointer, with `size_of::<T>()` as the
/// option length, so `T` has to match the type the option expects exactly
/// (`u32` for `CAN_RAW_ERR_FILTER`, `c_int` for most `SOL_SOCKET` options).
///
/// ```text
/// set_socket_option(fd, SOL_CAN_RAW, CAN_RAW_ERR_FILTER, &CAN_ERR_MASK)
/// ```
pub fn set_socket_option<T>(fd: RawFd,
                            level: libc::c_int,
                            name: libc::c_int,
                            val: &T) -> io::Result<()> {
    let r = unsafe {
        let val_ptr: *const T = val as *const T;
        libc::setsockopt(fd,
                         level,
                         name,
                         val_ptr as *const libc::c_void,
                         mem::size_of::<T>() as libc::socklen_t)
    };

    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Array form of `set_socket_option`. All of `values` go to the kernel in a
/// single call.
pub fn set_socket_option_mult<T>(fd: RawFd,
                                 level: libc::c_int,
                                 name: libc::c_int,
                                 values: &[T])
                                 -> io::Result<()> {

    let r = if values.is_empty() {
        // can't pass in a pointer to the first element if a 0-length slice,
        // pass a nullpointer instead
        unsafe { libc::setsockopt(fd, level, name, ptr::null(), 0) }
    } else {
        unsafe {
            libc::setsockopt(
                fd,
                level,
                name,
                values.as_ptr() as *const libc::c_void,
                mem::size_of_val(values) as libc::socklen_t)
        }
    };

    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

#[cfg(test)]
/// `getsockopt` wrapper reading back up to `buf.len()` values of `T`.
///
/// Returns how many complete values the kernel wrote.
pub fn get_socket_option_mult<T: Copy>(fd: RawFd,
                                       level: libc::c_int,
                                       name: libc::c_int,
                                       buf: &mut [T]) -> io::Result<usize> {
    let mut len = mem::size_of_val(buf) as libc::socklen_t;
    let r = unsafe {
        libc::getsockopt(fd,
                         level,
                         name,
                         buf.as_mut_ptr() as *mut libc::c_void,
                         &mut len)
    };

    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(len as usize / mem::size_of::<T>())
}

/// Put `fd` into non-blocking mode, keeping its other status flags.
pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    // retrieve current flags
    let oldfl = unsafe { libc::fcntl(fd, libc::F_GETFL) };

    if oldfl == -1 {
        return Err(io::Error::last_os_error());
    }

    if oldfl & libc::O_NONBLOCK != 0 {
        return Ok(());
    }

    let rv = unsafe { libc::fcntl(fd, libc::F_SETFL, oldfl | libc::O_NONBLOCK) };

    if rv == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
/// Check whether `fd` has `O_NONBLOCK` set.
pub fn is_nonblocking(fd: RawFd) -> io::Result<bool> {
    let fl = unsafe { libc::fcntl(fd, libc::F_GETFL) };

    if fl == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(fl & libc::O_NONBLOCK != 0)
}
