/*!
    Encoder option lists.
*/

/**
    Ordered list of encoder options.

    With the `ffmpeg` feature, [`EncoderOptions::parse`] reads them from a
    string of comma-separated pairs, where each pair is a key and a value
    separated by a space, using the engine's own dictionary parser:

    ```ignore
    let opts: EncoderOptions = "x264-params keyint=25:scenecut=-1,preset ultrafast".parse()?;
    assert_eq!(opts.get("preset"), Some("ultrafast"));
    ```

    Values may be quoted (`'ultra fast'`) and may escape a comma as `\,`.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    entries: Vec<(String, String)>,
}

impl EncoderOptions {
    /**
        Add an option. A later value for the same key replaces the earlier one.
    */
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_value_wins() {
        let mut opts = EncoderOptions::default();
        opts.set("preset", "fast");
        opts.set("crf", "23");
        opts.set("preset", "slow");
        assert_eq!(opts.len(), 2);
        assert_eq!(opts.get("preset"), Some("slow"));
        assert_eq!(
            opts.iter().collect::<Vec<_>>(),
            vec![("preset", "slow"), ("crf", "23")]
        );
    }

    #[test]
    fn empty_by_default() {
        let opts = EncoderOptions::default();
        assert!(opts.is_empty());
        assert_eq!(opts.get("preset"), None);
    }
}
