use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use java_properties::read;

use commons_error::*;

/// Read the env value.
/// It's the folder where we can find the properties for the service.
/// The "--env <folder>" argument wins over the environment variable.
pub fn read_env(var_name: &str) -> Option<String> {
    let args: Vec<String> = env::args().collect();
    read_env_from_args(&args, var_name)
}

fn read_env_from_args(args: &[String], var_name: &str) -> Option<String> {
    let mut dc_env: Option<String> = None;
    let mut index = 1;

    while index < args.len() {
        match args[index].as_str() {
            "--env" => {
                if let Some(k) = args.get(index + 1) {
                    dc_env = Some(k.clone());
                }
                index += 2; // Skip the value after "--env"
            }
            _ => {
                index += 1;
            }
        }
    }

    if dc_env.is_none() {
        dc_env = match env::var(var_name) {
            Ok(env) => Some(env),
            Err(e) => {
                eprintln!("🚫 Cannot find the {} system variable: {}", var_name, e);
                None
            }
        };
    }

    dc_env
}

/// Location of the property file of a service inside the env folder
pub fn property_file_path(env_folder: &Path, project_code: &str) -> PathBuf {
    env_folder.join(project_code).join("config").join("application.properties")
}

/// Read the properties of the service [project_code] from the env folder
pub fn read_config(project_code: &str, env_folder: &Option<String>) -> anyhow::Result<HashMap<String, String>> {
    let folder = env_folder.as_ref().ok_or_else(|| anyhow!("No env folder for [{}]", project_code))?;
    let property_file = property_file_path(Path::new(folder), project_code);
    read_config_from_path(&property_file)
}

/// Read a property file, then resolve the ${NAME} placeholders from the process environment
pub fn read_config_from_path(property_file: &Path) -> anyhow::Result<HashMap<String, String>> {
    println!("Read the properties from the file : {}", property_file.display());

    let f = File::open(property_file)
        .map_err(err_fwd!("💣 Cannot open the property file, file=[{}]", property_file.display()))?;
    let props = read(BufReader::new(f))
        .map_err(err_fwd!("💣 Cannot read the property file, file=[{}]", property_file.display()))?;

    let resolved_props: HashMap<String, String> =
        props.into_iter().map(|(key, value)| (key, replace_value_with_env(&value))).collect();

    Ok(resolved_props)
}

/// Override the properties with the environment variables of the (variable, property) list
pub fn override_from_env(props: &mut HashMap<String, String>, overrides: &[(&str, &str)]) {
    for (var_name, prop_name) in overrides {
        if let Ok(value) = env::var(var_name) {
            props.insert(prop_name.to_string(), value);
        }
    }
}

/// Replace the ${NAME} placeholders with the environment variable NAME.
/// Unknown variables are left as is.
fn replace_value_with_env(value: &str) -> String {
    let mut resolved = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        resolved.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match env::var(name) {
                    Ok(v) => resolved.push_str(&v),
                    Err(_) => resolved.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                resolved.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    resolved.push_str(rest);
    resolved
}
