use super::comparator::Comparator;
use super::engine::Tournament;
use super::error::RankingError;
use super::progress::ProgressSink;
use super::types::Winner;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 排名方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    /// 每对作品比较一次，按胜率排序
    #[default]
    RoundRobin,
    /// 逐个插入二叉树，比较次数约 N log N
    BinaryInsertion,
}

/// 所有 i < j 的作品对各比较一次，i 为 A 方。
/// 返回按胜率降序的下标，胜率相同保持输入顺序。
pub(crate) fn round_robin<C, P>(t: &mut Tournament<'_, C, P>) -> Result<Vec<usize>, RankingError>
where
    C: Comparator + ?Sized,
    P: ProgressSink + ?Sized,
{
    let n = t.len();
    let planned = n * n.saturating_sub(1) / 2;
    for i in 0..n {
        for j in (i + 1)..n {
            t.compare(i, j, Some(planned))?;
        }
    }

    let records = t.records();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| {
        records[y]
            .win_rate()
            .partial_cmp(&records[x].win_rate())
            .unwrap_or(Ordering::Equal)
    });
    Ok(order)
}

struct Node {
    item: usize,
    left: Option<usize>,
    right: Option<usize>,
}

impl Node {
    fn leaf(item: usize) -> Self {
        Self {
            item,
            left: None,
            right: None,
        }
    }
}

/// 按输入顺序插入二叉树：新作品为 A 方，赢了往右，输了往左。
/// 反向中序遍历即为名次。
pub(crate) fn binary_insertion<C, P>(
    t: &mut Tournament<'_, C, P>,
) -> Result<Vec<usize>, RankingError>
where
    C: Comparator + ?Sized,
    P: ProgressSink + ?Sized,
{
    let n = t.len();
    let mut nodes: Vec<Node> = Vec::with_capacity(n);

    for item in 0..n {
        let message = format!("Evaluating submission {}/{}: {}", item + 1, n, t.name(item));
        t.report(&message);

        if nodes.is_empty() {
            nodes.push(Node::leaf(item));
            continue;
        }

        let mut cursor = 0;
        loop {
            let winner = t.compare(item, nodes[cursor].item, None)?;
            let next = match winner {
                Winner::A => nodes[cursor].right,
                Winner::B => nodes[cursor].left,
            };
            match next {
                Some(child) => cursor = child,
                None => {
                    let id = nodes.len();
                    match winner {
                        Winner::A => nodes[cursor].right = Some(id),
                        Winner::B => nodes[cursor].left = Some(id),
                    }
                    nodes.push(Node::leaf(item));
                    break;
                }
            }
        }
    }

    // 右 -> 根 -> 左
    let mut order = Vec::with_capacity(n);
    let mut stack = Vec::new();
    let mut current = if nodes.is_empty() { None } else { Some(0) };
    while current.is_some() || !stack.is_empty() {
        while let Some(idx) = current {
            stack.push(idx);
            current = nodes[idx].right;
        }
        if let Some(idx) = stack.pop() {
            order.push(nodes[idx].item);
            current = nodes[idx].left;
        }
    }
    Ok(order)
}
