//! Python virtual environments.
//!
//! Environments are found by a fixed search order (see [`resolver`]) and
//! created through `python -m venv`. Activation cannot change the parent
//! shell directly, so [`Activation::shell_code`] returns the snippet the
//! shell wrapper evaluates.

mod manager;
mod resolver;

pub use manager::{
    create, creation_target, freeze, install_requirements, start, stop, Activation,
    CreateOptions, CreatedVenv,
};
pub use resolver::{
    activation_script, candidates, discover, is_explicit_path, python_bin, resolve,
    validate_name, VenvDescriptor,
};
