use web_sys::HtmlSelectElement;
use yew::prelude::*;

use crate::config::{MAX_VISIBLE_PAGES, PAGE_SIZES};

/// Number of pages for `len` rows; never less than one.
pub fn total_pages(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    len.div_ceil(per_page).max(1)
}

pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

/// Rows of 1-based `page`.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let page = clamp_page(page, total_pages(items.len(), per_page));
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());
    items.get(start..end).unwrap_or(&[])
}

/// Page buttons to show: at most `MAX_VISIBLE_PAGES`, centred on `current`
/// and shifted back inside `1..=total` at the edges.
pub fn visible_pages(current: usize, total: usize) -> std::ops::RangeInclusive<usize> {
    let total = total.max(1);
    let current = clamp_page(current, total);
    let mut start = current.saturating_sub(MAX_VISIBLE_PAGES / 2).max(1);
    let end = (start + MAX_VISIBLE_PAGES - 1).min(total);
    if end - start < MAX_VISIBLE_PAGES - 1 {
        start = end.saturating_sub(MAX_VISIBLE_PAGES - 1).max(1);
    }
    start..=end
}

/* ---------------- composants ---------------- */

#[derive(Properties, PartialEq)]
pub struct PaginationProps {
    pub current: usize,
    pub total: usize,
    pub on_change: Callback<usize>,
}

#[function_component(Pagination)]
pub fn pagination(props: &PaginationProps) -> Html {
    let current = props.current;
    let total = props.total.max(1);
    let go = |page: usize| {
        let on_change = props.on_change.clone();
        Callback::from(move |_: MouseEvent| on_change.emit(page))
    };

    html! {
        <div class="pagination">
            <button class="page-btn" disabled={current <= 1} onclick={go(current.saturating_sub(1).max(1))}>{"‹"}</button>
            { for visible_pages(current, total).map(|page| html! {
                <button
                    key={page}
                    class={classes!("page-btn", (page == current).then_some("active"))}
                    onclick={go(page)}
                >
                    { page }
                </button>
            }) }
            <button class="page-btn" disabled={current >= total} onclick={go((current + 1).min(total))}>{"›"}</button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct PageSizeProps {
    pub value: usize,
    pub on_change: Callback<usize>,
}

#[function_component(PageSizeSelect)]
pub fn page_size_select(props: &PageSizeProps) -> Html {
    let onchange = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            if let Ok(size) = select.value().parse() {
                on_change.emit(size);
            }
        })
    };

    html! {
        <label class="page-size">
            {"Tampilkan "}
            <select {onchange}>
                { for PAGE_SIZES.iter().map(|size| html! {
                    <option value={size.to_string()} selected={*size == props.value}>{ size }</option>
                }) }
            </select>
            {" data"}
        </label>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up_and_is_at_least_one() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 1);
    }

    #[test]
    fn paginate_slices_and_clamps() {
        let rows: Vec<u32> = (1..=23).collect();
        assert_eq!(paginate(&rows, 1, 10), &rows[0..10]);
        assert_eq!(paginate(&rows, 3, 10), &[21, 22, 23]);
        assert_eq!(paginate(&rows, 9, 10), &[21, 22, 23]);
        assert_eq!(paginate(&rows, 0, 10), &rows[0..10]);
        assert!(paginate::<u32>(&[], 1, 10).is_empty());
    }

    #[test]
    fn window_is_centred_and_shifted_at_edges() {
        assert_eq!(visible_pages(1, 10), 1..=5);
        assert_eq!(visible_pages(5, 10), 3..=7);
        assert_eq!(visible_pages(10, 10), 6..=10);
        assert_eq!(visible_pages(2, 3), 1..=3);
        assert_eq!(visible_pages(1, 1), 1..=1);
    }

    #[test]
    fn window_tolerates_out_of_range_current() {
        assert_eq!(visible_pages(20, 10), 6..=10);
        assert_eq!(visible_pages(0, 10), 1..=5);
        assert_eq!(visible_pages(4, 0), 1..=1);
    }
}
