use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Имя файла конфигурации внутри каталога конфигураций пользователя
pub const CONFIG_FILE_NAME: &str = "swayfade.toml";

/// Верхняя граница `steps`: при 60 кадрах в секунду это почти три минуты на переход
pub const MAX_STEPS: f64 = 10_000.0;

const DEFAULT_RATE: f64 = 0.016;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Прозрачность окна в фокусе
    pub focused: f64,
    /// Прозрачность окна без фокуса
    pub unfocused: f64,
    /// Пауза между шагами анимации, в секундах
    pub rate: f64,
    /// Количество шагов для полного перехода 0 -> 1
    pub steps: f64,
    pub rules: Vec<Rule>,
    // Производное значение - не сериализуется, строится после загрузки
    #[serde(skip)]
    step_fraction: f64,
    #[serde(skip)]
    step_interval: Duration,
}

/// Правило прозрачности для окон, подходящих под app_id / тип контейнера.
/// Незаданные прозрачности наследуются из глобальных настроек.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Rule {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub floating: Option<bool>,
    #[serde(default)]
    pub focused: Option<f64>,
    #[serde(default)]
    pub unfocused: Option<f64>,
}

impl Rule {
    /// Пустой app_id и незаданный floating совпадают с любым окном
    pub fn matches(&self, app_id: &str, is_floating: bool) -> bool {
        (self.app_id.is_empty() || self.app_id == app_id)
            && self.floating.map_or(true, |floating| floating == is_floating)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            focused: 1.0,
            unfocused: 0.7,
            rate: DEFAULT_RATE,
            steps: 14.0,
            rules: Vec::new(),
            step_fraction: 0.0,
            step_interval: Duration::ZERO,
        };
        config.build_derived_values();
        config
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/swayfade.toml`, либо `~/.config/swayfade.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_FILE_NAME)
    }

    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующий файл не ошибка: figment просто вернёт значения по умолчанию
        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SWAYFADE_"));

        Self::from_figment(figment)
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let mut config: Config = figment.extract()?;

        config.validate()?;
        config.build_derived_values();

        Ok(config)
    }

    /// Переводит количество шагов в долю перехода на один шаг, а `rate` в паузу
    pub fn build_derived_values(&mut self) {
        self.step_fraction = 1.0 / self.steps;
        // непредставимый rate отсекается в validate()
        self.step_interval = Duration::try_from_secs_f64(self.rate)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_RATE));
    }

    pub fn validate(&self) -> Result<()> {
        check_opacity("focused", self.focused)?;
        check_opacity("unfocused", self.unfocused)?;

        if !self.rate.is_finite() || self.rate <= 0.0 {
            anyhow::bail!("rate должно быть положительным числом секунд, получено {}", self.rate);
        }
        Duration::try_from_secs_f64(self.rate)
            .with_context(|| format!("rate слишком велико: {}", self.rate))?;

        if !self.steps.is_finite() || !(1.0..=MAX_STEPS).contains(&self.steps) {
            anyhow::bail!("steps должно быть от 1 до {}, получено {}", MAX_STEPS, self.steps);
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if let Some(focused) = rule.focused {
                check_opacity(&format!("rules[{}].focused", i), focused)?;
            }
            if let Some(unfocused) = rule.unfocused {
                check_opacity(&format!("rules[{}].unfocused", i), unfocused)?;
            }
        }

        Ok(())
    }

    /// Доля полного перехода, проходимая за один шаг анимации (`1 / steps`)
    pub fn step_fraction(&self) -> f64 {
        self.step_fraction
    }

    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// ЕДИНСТВЕННЫЙ метод выбора прозрачностей для окна: первое подходящее правило
    /// побеждает, иначе глобальные значения. Возвращает `(focused, unfocused)`.
    pub fn resolve_opacity(&self, app_id: &str, is_floating: bool) -> (f64, f64) {
        self.rules
            .iter()
            .find(|rule| rule.matches(app_id, is_floating))
            .map(|rule| {
                (
                    rule.focused.unwrap_or(self.focused),
                    rule.unfocused.unwrap_or(self.unfocused),
                )
            })
            .unwrap_or((self.focused, self.unfocused))
    }
}

fn check_opacity(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        anyhow::bail!("Неверное значение прозрачности {}: {}", name, value);
    }
    Ok(())
}
