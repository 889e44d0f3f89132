use std::sync::mpsc::Sender;

/// 单次排名过程的进度输出，由调用方持有
pub trait ProgressSink {
    fn report(&mut self, message: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(&str),
{
    fn report(&mut self, message: &str) {
        self(message)
    }
}

/// 通过通道把进度转发给其他线程；接收端关闭后静默丢弃
pub struct ChannelProgress {
    sender: Sender<String>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<String>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&mut self, message: &str) {
        let _ = self.sender.send(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |m: &str| seen.push(m.to_string());
            sink.report("one");
            sink.report("two");
        }
        assert_eq!(seen, vec!["one", "two"]);
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        let mut sink = ChannelProgress::new(tx);
        sink.report("hello");
        assert_eq!(rx.recv().unwrap(), "hello");
        drop(rx);
        sink.report("nobody listening");
    }
}
