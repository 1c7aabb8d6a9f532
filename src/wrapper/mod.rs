pub mod command;
pub mod env_file;
pub mod job;
pub mod notifications;
pub mod pipeline;
pub mod redacted;
pub mod restic_output;
pub mod result_error;
pub mod runner;
pub mod validate;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
