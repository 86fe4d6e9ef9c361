use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use shihua_config::GeneratorConfig;
use shihua_config::config::DEFAULT_AUTHOR;
use shihua_core::PoemRecord;
use tracing::debug;

use crate::generator::PoemGenerator;

/// `(title, content)` pairs the static generator picks from.
pub const CLASSIC_CORPUS: [(&str, &str); 5] = [
    (
        "春日偶成",
        "云淡风轻近午天，傍花随柳过前川。\n时人不识余心乐，将谓偷闲学少年。",
    ),
    (
        "山行",
        "远上寒山石径斜，白云生处有人家。\n停车坐爱枫林晚，霜叶红于二月花。",
    ),
    (
        "静夜思",
        "床前明月光，疑是地上霜。\n举头望明月，低头思故乡。",
    ),
    (
        "望庐山瀑布",
        "日照香炉生紫烟，遥看瀑布挂前川。\n飞流直下三千尺，疑是银河落九天。",
    ),
    (
        "饮湖上初晴后雨",
        "水光潋滟晴方好，山色空蒙雨亦奇。\n欲把西湖比西子，淡妆浓抹总相宜。",
    ),
];

/// Picks a poem uniformly at random from [`CLASSIC_CORPUS`], ignoring the
/// image entirely.
#[derive(Debug, Clone)]
pub struct StaticCorpusGenerator {
    author: String,
    delay: Duration,
}

impl Default for StaticCorpusGenerator {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            delay: Duration::ZERO,
        }
    }
}

impl StaticCorpusGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::default()
            .with_author(config.author.clone())
            .with_delay(Duration::from_millis(config.simulated_delay_ms))
    }

    /// Attribution for generated poems. Blank values keep the current one.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        if !author.trim().is_empty() {
            self.author = author;
        }
        self
    }

    /// Latency added before each poem is returned.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> PoemRecord {
        let (title, content) = CLASSIC_CORPUS
            .choose(rng)
            .copied()
            .unwrap_or(CLASSIC_CORPUS[0]);
        PoemRecord::new(title, content, self.author.clone())
    }
}

#[async_trait]
impl PoemGenerator for StaticCorpusGenerator {
    async fn generate(&self, image_reference: &str) -> PoemRecord {
        let poem = self.pick(&mut rand::thread_rng());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        debug!(image = image_reference, title = %poem.title, "generated poem");
        poem
    }
}
