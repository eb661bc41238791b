use serde::{Deserialize, Serialize};

/// Serialized form of a target: its registers, their aliases and its register classes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDescription {
    pub name: String,
    pub registers: Vec<RegisterDescription>,
    pub classes: Vec<ClassDescription>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDescription {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescription {
    pub name: String,
    #[serde(default = "default_register_size")]
    pub register_size: u32,
    pub registers: Vec<String>,
}

fn default_register_size() -> u32 {
    1
}

impl MachineDescription {
    pub fn new(name: &str) -> MachineDescription {
        MachineDescription {
            name: name.to_string(),
            registers: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<MachineDescription> {
        serde_json::from_str(text)
    }

    pub fn register(&mut self, name: &str, aliases: &[&str]) -> &mut Self {
        self.registers.push(RegisterDescription {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    pub fn class(&mut self, name: &str, register_size: u32, registers: &[&str]) -> &mut Self {
        self.classes.push(ClassDescription {
            name: name.to_string(),
            register_size,
            registers: registers.iter().map(|r| r.to_string()).collect(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_defaults() {
        let description = MachineDescription::from_json(
            r#"{
                "name": "tiny",
                "registers": [{"name": "a"}, {"name": "b"}, {"name": "ab", "aliases": ["a", "b"]}],
                "classes": [{"name": "byte", "registers": ["a", "b"]}, {"name": "word", "register_size": 2, "registers": ["ab"]}]
            }"#,
        )
        .unwrap();
        let mut expected = MachineDescription::new("tiny");
        expected
            .register("a", &[])
            .register("b", &[])
            .register("ab", &["a", "b"])
            .class("byte", 1, &["a", "b"])
            .class("word", 2, &["ab"]);
        assert_eq!(description, expected);
    }
}
