#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use duo_kaggle::config::{AppConfig, RepoConfig};
use duo_kaggle::{CommandOutput, CommandRunner, CommandSpec, Confirm};

pub const PATCHED_DATALOADER: &str = r#"import os

def get_dataset(name):
    subset_num = os.getenv("OWT_SUBSET_NUM")
    if subset_num:
        subset_split = f"train[:{subset_num}]"
        print("Using OpenWebText subset")
"#;

/// Records every command and answers from a small script.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Mutex<Vec<CommandSpec>>,
    /// Programs whose captured runs exit 1.
    pub failing: Vec<String>,
    /// `python -c "import <module>"` probes that exit 1.
    pub missing_modules: Vec<String>,
    /// Exit code of the training process.
    pub train_exit: i32,
    /// Files (relative to the trainer cwd) created when training runs.
    pub train_outputs: Vec<(String, Vec<u8>)>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, program: &str) -> Self {
        self.failing.push(program.to_string());
        self
    }

    pub fn missing_module(mut self, module: &str) -> Self {
        self.missing_modules.push(module.to_string());
        self
    }

    pub fn train_exit(mut self, code: i32) -> Self {
        self.train_exit = code;
        self
    }

    pub fn train_output(mut self, rel: &str, content: &[u8]) -> Self {
        self.train_outputs.push((rel.to_string(), content.to_vec()));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn output(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        let import_missing = spec.args.len() == 2
            && spec.args[0] == "-c"
            && self
                .missing_modules
                .iter()
                .any(|m| spec.args[1] == format!("import {m}"));
        let code = if self.failing.contains(&spec.program) || import_missing {
            1
        } else {
            0
        };

        Ok(CommandOutput {
            code: Some(code),
            stdout: if spec.program == "nvidia-smi" {
                "| NVIDIA-SMI 535.104 |\n| Tesla P100 |\n".to_string()
            } else {
                String::new()
            },
            stderr: if code == 0 {
                String::new()
            } else {
                format!("{} failed", spec.program)
            },
        })
    }

    async fn status(&self, spec: &CommandSpec) -> io::Result<Option<i32>> {
        self.calls.lock().unwrap().push(spec.clone());

        if let Some(ref cwd) = spec.cwd {
            for (rel, content) in &self.train_outputs {
                let path = cwd.join(rel);
                std::fs::create_dir_all(path.parent().unwrap())?;
                std::fs::write(&path, content)?;
            }
        }
        Ok(Some(self.train_exit))
    }
}

/// Answers every prompt the same way and counts the questions.
pub struct ScriptedConfirm {
    pub answer: bool,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        self.asked.lock().unwrap().push(question.to_string());
        Ok(self.answer)
    }
}

pub fn touch(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A DUO checkout with the patched dataloader and every Hydra config.
pub fn patched_checkout(root: &Path) {
    touch(&root.join("main.py"), "print('train')\n");
    touch(&root.join("dataloader.py"), PATCHED_DATALOADER);
    touch(&root.join("configs/config.yaml"), "defaults: []\n");
    touch(&root.join("configs/data/openwebtext-split.yaml"), "name: owt\n");
    touch(&root.join("configs/algo/duo_base.yaml"), "name: duo\n");
}

/// Config whose Kaggle paths all live under `base`.
pub fn sandbox_config(base: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.repo = RepoConfig {
        input_dir: base.join("kaggle/input/duo"),
        working_dir: base.join("kaggle/working"),
        ..RepoConfig::default()
    };
    config.output.dir = base.join("kaggle/working/duo_results");
    config
}

pub fn output_dir(config: &AppConfig) -> PathBuf {
    config.output.dir.clone()
}
