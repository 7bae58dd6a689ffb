//! Every [`Config`] for `fab`, and a single place to register them.

use fab_cfg::{Config, ConfigSetBuilder};

pub static SHELL: Config<&'static str> = Config::new(
    "shell",
    "Shell used to run rule commands, invoked as `<shell> -c <command>`.",
    "/bin/sh",
);

pub static ECHO_COMMANDS: Config<bool> = Config::new(
    "echo_commands",
    "Print every command to stdout before running it.",
    true,
);

pub static BUILD_FILENAME: Config<&'static str> = Config::new(
    "build_filename",
    "The filename of the build description, looked up in the working directory.",
    "Fabfile.toml",
);

pub fn all_cfgs(builder: &mut ConfigSetBuilder) {
    builder
        .register(&SHELL)
        .register(&ECHO_COMMANDS)
        .register(&BUILD_FILENAME);
}
